//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::SessionError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_FILE: &str = ".collabmatch/session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash.
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Where the token and user snapshot are persisted between runs.
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Config pointing at `api_url` with every other value defaulted.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            timeouts: Timeouts::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `COLLABMATCH_API_URL`: default `http://127.0.0.1:4000/api`
    /// - `COLLABMATCH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `COLLABMATCH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COLLABMATCH_SESSION_FILE`: default `.collabmatch/session.json`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when the API URL is not http(s) or a
    /// timeout is set but not a positive integer.
    pub fn from_env() -> Result<Self, SessionError> {
        let api_url = std::env::var("COLLABMATCH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_secs("COLLABMATCH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("COLLABMATCH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let session_file = std::env::var("COLLABMATCH_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Self { api_url: String::new(), timeouts, session_file }.with_api_url(&api_url)
    }

    /// Replace the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] when `raw` is not an http(s) URL.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, SessionError> {
        validate_base_url(raw)?;
        self.api_url = normalize_base_url(raw);
        Ok(self)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn validate_base_url(raw: &str) -> Result<(), SessionError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(())
    } else {
        Err(SessionError::Config(format!("API URL must be http(s): {trimmed}")))
    }
}

fn env_parse_secs(key: &str, default: u64) -> Result<u64, SessionError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(SessionError::Config(format!("{key} must be a positive integer, got {raw:?}"))),
        Ok(secs) => Ok(secs),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
