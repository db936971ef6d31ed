use std::time::Duration;

use crate::error::ClientError;

pub const API_URL_VAR: &str = "UPM_API_URL";
pub const API_PREFIX_VAR: &str = "UPM_API_PREFIX";
pub const ACCESS_TOKEN_VAR: &str = "UPM_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "UPM_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Scheme, host and port, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Path segment inserted before every records route, e.g. `/default`
    pub path_prefix: String,
    /// Bearer token issued by the login flow
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            path_prefix: String::new(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = normalize_prefix(prefix);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ClientError::MissingConfig(API_URL_VAR.to_string()))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig {
                key: API_URL_VAR.to_string(),
                message: format!("expected an http(s) URL, got {base_url}"),
            });
        }

        let mut config = Self::new(base_url.trim());

        if let Some(prefix) = lookup(API_PREFIX_VAR) {
            config = config.with_prefix(&prefix);
        }

        if let Some(token) = lookup(ACCESS_TOKEN_VAR).filter(|t| !t.trim().is_empty()) {
            config = config.with_token(token.trim());
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ClientError::InvalidConfig {
                    key: TIMEOUT_VAR.to_string(),
                    message: e.to_string(),
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
