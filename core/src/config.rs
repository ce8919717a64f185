//! Client configuration.
//!
//! Defaults target the production SweepBright API. `from_env` lets
//! deployments and tests point the client elsewhere without code changes.

use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://website.sweepbright.com/api";
pub const DEFAULT_API_VERSION: u32 = 20191125;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_BASE_URL: &str = "SWEEPBRIGHT_BASE_URL";
const ENV_API_VERSION: &str = "SWEEPBRIGHT_API_VERSION";
const ENV_TIMEOUT_SECS: &str = "SWEEPBRIGHT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash.
    pub base_url: String,
    /// Sent in the `Accept` header as `application/vnd.sweepbright.v{version}+json`.
    pub api_version: u32,
    pub user_agent: String,
    /// Whole-request timeout enforced by the HTTP client. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION,
            user_agent: format!("sweepbright-rs/{}", env!("CARGO_PKG_VERSION")),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SWEEPBRIGHT_BASE_URL`, `SWEEPBRIGHT_API_VERSION`
    /// and `SWEEPBRIGHT_TIMEOUT_SECS` when they are set.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(&url);
        }
        if let Some(version) = lookup(ENV_API_VERSION) {
            config.api_version = version
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("{ENV_API_VERSION} must be a positive integer, got {version:?}")))?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got {secs:?}")))?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of the versioned `Accept` header.
    pub fn accept_header(&self) -> String {
        format!("application/vnd.sweepbright.v{}+json", self.api_version)
    }

    /// Absolute URL for an endpoint relative to the API root.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_target_production() {
        let config = ClientConfig::default();
        assert_eq!(config.url("estates/1"), "https://website.sweepbright.com/api/estates/1");
        assert_eq!(config.accept_header(), "application/vnd.sweepbright.v20191125+json");
        assert!(config.user_agent.starts_with("sweepbright-rs/"));
    }

    #[test]
    fn slashes_are_normalized() {
        let config = ClientConfig::default().with_base_url("http://localhost:3000/api/");
        assert_eq!(config.url("/contacts"), "http://localhost:3000/api/contacts");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://127.0.0.1:9000/"),
            (ENV_API_VERSION, "20200101"),
            (ENV_TIMEOUT_SECS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api_version, 20200101);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn malformed_environment_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_VERSION, "v2")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains(ENV_API_VERSION)));
    }

    #[test]
    fn missing_environment_keeps_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
