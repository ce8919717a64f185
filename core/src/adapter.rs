//! Transport boundary between the facade and the SweepBright API.
//!
//! # Design
//! `ApiAdapter` is the narrow contract the facade consumes: token handling
//! plus one raw request primitive. The provided `request` method layers JSON
//! encoding of request objects and JSON decoding of bodies on top of it.
//!
//! `HttpApiAdapter` keeps the I/O at the edge: requests are built as plain
//! `HttpRequest` values, executed with `ureq`, and the resulting
//! `HttpResponse` is classified by `classify_response`. The cached access
//! token sits behind a mutex that stays locked for the whole credential
//! exchange, so concurrent callers never refresh at the same time.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ServerValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::RequestObject;

/// An OAuth2 bearer token obtained with client credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Absolute expiry. `None` means the provider did not say.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    pub fn has_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Boundary contract implemented by transports.
pub trait ApiAdapter {
    /// Install a previously obtained token.
    fn set_access_token(&self, token: AccessToken);

    /// Obtain a client-credentials token, reusing the current one while it is
    /// unexpired.
    fn request_access_token(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, ApiError>;

    /// Perform one authenticated call. `Ok(None)` means the server answered
    /// 404.
    fn request_body(&self, method: HttpMethod, endpoint: &str, body: Option<String>) -> Result<Option<String>, ApiError>;

    /// Send an optional request object as JSON and decode the JSON reply.
    /// A 404 or an empty body yields `Ok(None)`.
    fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        request: Option<&RequestObject>,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        let body = request
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        match self.request_body(method, endpoint, body)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ApiError::Deserialization(e.to_string())),
            _ => Ok(None),
        }
    }
}

/// Map an API response to its body, `None` for 404, or the matching error.
pub fn classify_response(response: HttpResponse) -> Result<Option<String>, ApiError> {
    debug!(status = response.status, "received response");
    match response.status {
        200..=299 => Ok(Some(response.body)),
        404 => Ok(None),
        422 => {
            let err = ServerValidationError::from_body(&response.body);
            warn!(fields = err.fields.len(), "server rejected request payload");
            Err(err.into())
        }
        status => Err(ApiError::Http {
            status,
            body: response.body,
        }),
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

/// Map a token endpoint response to a token or an authentication failure.
pub fn classify_token_response(response: HttpResponse) -> Result<AccessToken, ApiError> {
    match response.status {
        200..=299 => {
            let parsed: TokenResponse =
                serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
            let mut token = AccessToken::new(parsed.access_token, parsed.expires_in);
            token.token_type = parsed.token_type;
            Ok(token)
        }
        400 | 401 | 403 => {
            let reason = serde_json::from_str::<TokenErrorResponse>(&response.body)
                .ok()
                .and_then(|e| e.error_description.or(e.message).or(e.error))
                .unwrap_or(response.body);
            Err(ApiError::Authentication(reason))
        }
        status => Err(ApiError::Http {
            status,
            body: response.body,
        }),
    }
}

/// Production adapter talking HTTPS to the SweepBright API.
#[derive(Debug)]
pub struct HttpApiAdapter {
    config: ClientConfig,
    agent: ureq::Agent,
    token: Mutex<Option<AccessToken>>,
}

impl HttpApiAdapter {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();

        Self {
            config,
            agent,
            token: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token currently installed, if any.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.token.lock().clone()
    }

    /// Build an authenticated API request.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<String>,
        token: &AccessToken,
    ) -> HttpRequest {
        let mut headers = self.common_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        headers.push(("authorization".to_string(), token.authorization_header()));

        HttpRequest {
            method,
            url: self.config.url(endpoint),
            headers,
            body,
        }
    }

    /// Build the client-credentials token request.
    pub fn build_token_request(&self, client_id: &str, client_secret: &str) -> HttpRequest {
        let mut headers = self.common_headers();
        headers.push((
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));

        let body = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        HttpRequest {
            method: HttpMethod::Post,
            url: self.config.url("oauth/token"),
            headers,
            body: Some(body),
        }
    }

    fn common_headers(&self) -> Vec<(String, String)> {
        vec![
            ("accept".to_string(), self.config.accept_header()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
        ]
    }

    fn current_token(&self) -> Result<AccessToken, ApiError> {
        match self.token.lock().as_ref() {
            None => Err(ApiError::Authentication("missing access token".to_string())),
            Some(token) if token.has_expired() => Err(ApiError::Authentication("access token has expired".to_string())),
            Some(token) => Ok(token.clone()),
        }
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(&url), &headers).send(body.as_bytes()),
            (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(&url), &headers).send(body.as_bytes()),
            (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &headers).send_empty(),
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl ApiAdapter for HttpApiAdapter {
    fn set_access_token(&self, token: AccessToken) {
        *self.token.lock() = Some(token);
    }

    fn request_access_token(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, ApiError> {
        let mut current = self.token.lock();
        if let Some(token) = current.as_ref().filter(|t| !t.has_expired()) {
            info!("reusing unexpired access token");
            return Ok(token.clone());
        }

        let response = self.execute(self.build_token_request(client_id, client_secret))?;
        let token = classify_token_response(response)?;
        info!(expires_at = ?token.expires_at, "obtained access token");
        *current = Some(token.clone());
        Ok(token)
    }

    fn request_body(&self, method: HttpMethod, endpoint: &str, body: Option<String>) -> Result<Option<String>, ApiError> {
        let token = self.current_token()?;
        let request = self.build_request(method, endpoint, body, &token);
        classify_response(self.execute(request)?)
    }
}
