//! The SweepBright API facade.
//!
//! # Design
//! `SweepBright` owns an `ApiAdapter` and turns each operation into one
//! endpoint call. Payloads are validated into `RequestObject`s before any
//! I/O happens, so a `ClientValidation` error means nothing was sent.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::{AccessToken, ApiAdapter, HttpApiAdapter};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::properties::Properties;
use crate::request::RequestObject;
use crate::response::ResponseObject;
use crate::schema::SchemaRegistry;
use crate::types::{SaveContactRequest, SetEstateUrlRequest};
use crate::value::Input;

/// Client for the SweepBright estate API.
#[derive(Debug)]
pub struct SweepBright<A = HttpApiAdapter> {
    adapter: A,
    registry: Arc<SchemaRegistry>,
}

impl SweepBright<HttpApiAdapter> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_adapter(HttpApiAdapter::new(config))
    }

    /// Client configured from `SWEEPBRIGHT_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl Default for SweepBright<HttpApiAdapter> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<A: ApiAdapter> SweepBright<A> {
    pub fn with_adapter(adapter: A) -> Self {
        Self {
            adapter,
            registry: SchemaRegistry::global(),
        }
    }

    /// Use a private schema registry instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn set_access_token(&self, token: AccessToken) {
        self.adapter.set_access_token(token);
    }

    pub fn request_access_token(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, ApiError> {
        self.adapter.request_access_token(client_id, client_secret)
    }

    /// Fetch an estate. `Ok(None)` when the API does not know the id.
    pub fn get_estate(&self, estate_id: &str) -> Result<Option<ResponseObject>, ApiError> {
        let endpoint = format!("estates/{}", urlencoding::encode(estate_id));
        let Some(body) = self.adapter.request(HttpMethod::Get, &endpoint, None)? else {
            debug!(estate_id, "estate not found");
            return Ok(None);
        };

        ResponseObject::from_json(body)
            .map(Some)
            .ok_or_else(|| ApiError::Deserialization("estate response is not a JSON object".to_string()))
    }

    /// Publish the public URL of an estate.
    pub fn set_estate_url(&self, estate_id: &str, url: &str) -> Result<(), ApiError> {
        let mut request = RequestObject::new_in::<SetEstateUrlRequest>(&self.registry);
        request.set("url", url)?;

        let endpoint = format!("estates/{}/url", urlencoding::encode(estate_id));
        self.adapter.request(HttpMethod::Put, &endpoint, Some(&request))?;
        Ok(())
    }

    /// Submit a lead. `preferences` and `location_preference`, when given,
    /// replace the matching entries of `data`.
    pub fn save_contact(
        &self,
        data: impl Into<Input>,
        preferences: Option<Input>,
        location_preference: Option<Input>,
    ) -> Result<(), ApiError> {
        let mut request = RequestObject::from_input_in::<SaveContactRequest>(&self.registry, data)?;
        if let Some(preferences) = preferences.filter(|p| *p != Input::Null) {
            request.set("preferences", preferences)?;
        }
        if let Some(location) = location_preference.filter(|l| *l != Input::Null) {
            request.set("location_preference", location)?;
        }

        self.adapter.request(HttpMethod::Post, "contacts", Some(&request))?;
        Ok(())
    }

    /// Submit a lead about a specific estate.
    pub fn save_estate_contact(&self, estate_id: &str, data: impl Into<Input>) -> Result<(), ApiError> {
        let request = RequestObject::from_input_in::<SaveContactRequest>(&self.registry, data)?;

        let endpoint = format!("estates/{}/contacts", urlencoding::encode(estate_id));
        self.adapter.request(HttpMethod::Post, &endpoint, Some(&request))?;
        Ok(())
    }
}
