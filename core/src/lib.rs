//! Typed client for the SweepBright estate-management API.
//!
//! # Overview
//! Request payloads are dynamic property bags checked against per-type
//! schemas: unknown names and wrongly typed values are rejected before
//! anything reaches the network, and camelCase aliases resolve to the
//! snake_case wire names. Responses come back as schema-less objects whose
//! ISO-8601 strings are decoded into timestamps.
//!
//! # Design
//! - `schema` holds the per-type metadata, built once per type and shared
//!   through a thread-safe `SchemaRegistry`.
//! - `request` and `response` both implement the `Properties` access trait.
//! - `adapter` is the transport seam. `HttpApiAdapter` builds plain
//!   `HttpRequest` values and only executes them at the edge, so status
//!   mapping and header construction are testable without a network.
//! - `client::SweepBright` is the facade exposing one method per endpoint.

pub mod adapter;
pub mod client;
mod coerce;
pub mod config;
pub mod error;
pub mod http;
pub mod naming;
pub mod properties;
pub mod request;
pub mod response;
pub mod schema;
pub mod types;
pub mod value;

pub use adapter::{classify_response, AccessToken, ApiAdapter, HttpApiAdapter};
pub use client::SweepBright;
pub use config::ClientConfig;
pub use error::{ApiError, ClientValidationError, FieldError, ServerValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use properties::Properties;
pub use request::RequestObject;
pub use response::{ResponseObject, ResponseValue};
pub use schema::{Primitive, RequestType, Schema, SchemaRegistry, TypeDescriptor};
pub use types::{SaveContactRequest, SaveContactRequestLocationPreference, SaveContactRequestPreferences, SetEstateUrlRequest};
pub use value::{Input, Value};
