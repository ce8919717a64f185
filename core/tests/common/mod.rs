//! In-process adapter that replays canned responses and records every call.

#![allow(dead_code)]

use std::collections::VecDeque;

use parking_lot::Mutex;
use sweepbright_core::{classify_response, AccessToken, ApiAdapter, ApiError, HttpMethod, HttpResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct ScriptedAdapter {
    responses: Mutex<VecDeque<HttpResponse>>,
    calls: Mutex<Vec<Call>>,
    token: Mutex<Option<AccessToken>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        let adapter = Self::default();
        adapter.responses.lock().extend(responses);
        adapter
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn token(&self) -> Option<AccessToken> {
        self.token.lock().clone()
    }
}

impl ApiAdapter for ScriptedAdapter {
    fn set_access_token(&self, token: AccessToken) {
        *self.token.lock() = Some(token);
    }

    fn request_access_token(&self, client_id: &str, _client_secret: &str) -> Result<AccessToken, ApiError> {
        let mut token = self.token.lock();
        let issued = token
            .clone()
            .unwrap_or_else(|| AccessToken::new(format!("token-for-{client_id}"), Some(3600)));
        *token = Some(issued.clone());
        Ok(issued)
    }

    fn request_body(&self, method: HttpMethod, endpoint: &str, body: Option<String>) -> Result<Option<String>, ApiError> {
        self.calls.lock().push(Call {
            method,
            endpoint: endpoint.to_string(),
            body: body.map(|b| serde_json::from_str(&b).expect("request body should be JSON")),
        });
        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| HttpResponse::new(200, ""));
        classify_response(response)
    }
}
