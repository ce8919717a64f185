//! Error types for the SweepBright API client.
//!
//! # Design
//! Client-side schema violations (`ClientValidationError`) are raised before
//! any network I/O and carry enough context to point at the offending field.
//! Server-side rejections (HTTP 422) keep the structured field list from the
//! response body. A 404 is not an error at all: adapters turn it into `None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A caller-side schema violation on a request or response object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientValidationError {
    /// The name does not resolve to any property of the object.
    #[error("{property} is not a valid property of {type_name}")]
    UnknownProperty { type_name: String, property: String },

    /// The value cannot be coerced to the property's declared type.
    #[error("{type_name}::{property} expects {expected}, got {actual} instead")]
    InvalidPropertyType {
        type_name: String,
        property: String,
        expected: String,
        actual: String,
    },
}

impl ClientValidationError {
    pub(crate) fn unknown(type_name: &str, property: &str) -> Self {
        Self::UnknownProperty {
            type_name: type_name.to_string(),
            property: property.to_string(),
        }
    }

    pub(crate) fn invalid_type(type_name: &str, property: &str, expected: impl ToString, actual: &str) -> Self {
        Self::InvalidPropertyType {
            type_name: type_name.to_string(),
            property: property.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Name of the property the error refers to.
    pub fn property(&self) -> &str {
        match self {
            Self::UnknownProperty { property, .. } | Self::InvalidPropertyType { property, .. } => property,
        }
    }
}

/// Messages the server attached to one rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

/// The server rejected a payload with HTTP 422.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServerValidationError {
    pub message: String,
    pub fields: Vec<FieldError>,
}

const DEFAULT_VALIDATION_MESSAGE: &str = "the given data was invalid";

impl ServerValidationError {
    /// Build the error from a raw 422 response body.
    ///
    /// The field list comes from the body's `errors` member, which is either
    /// an object of `field -> [messages]` or a plain list of messages. A body
    /// that is not JSON yields an empty field list.
    pub fn from_body(body: &str) -> Self {
        let parsed: serde_json::Value = serde_json::from_str(body).unwrap_or_default();

        let message = parsed
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(DEFAULT_VALIDATION_MESSAGE)
            .to_string();

        let fields = match parsed.get("errors") {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(field, messages)| FieldError {
                    field: field.clone(),
                    messages: messages_of(messages),
                })
                .collect(),
            Some(serde_json::Value::Array(items)) => vec![FieldError {
                field: String::new(),
                messages: items.iter().flat_map(messages_of).collect(),
            }],
            _ => Vec::new(),
        };

        Self { message, fields }
    }

    /// Messages for `field`, if the server rejected it.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.messages.as_slice())
    }
}

fn messages_of(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items.iter().flat_map(messages_of).collect(),
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// Errors returned by the API client and its adapters.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    ClientValidation(#[from] ClientValidationError),

    #[error("server validation failed: {0}")]
    ServerValidation(#[from] ServerValidationError),

    /// No usable access token, or the identity provider rejected the
    /// credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server returned a non-2xx status other than 404 and 422.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
