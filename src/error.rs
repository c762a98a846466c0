//! Session error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Transport and server failures are surfaced to callers verbatim so the UI
//! layer can render the server's own message. Nothing here is retried
//! automatically; `retryable()` is only a hint for callers.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors produced by session operations and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("{0}")]
    Transport(String),

    /// The API rejected the request (4xx). `message` is the server's text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The API failed (5xx). `message` is the server's text.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The persisted token is no longer accepted by the API.
    #[error("stored session token is invalid or expired")]
    InvalidToken,

    /// A response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Reading or writing persisted session data failed.
    #[error("session storage failed: {0}")]
    Storage(String),

    /// The operation needs an active session and none exists.
    #[error("not signed in")]
    NotAuthenticated,

    /// A newer session operation started before this one finished, so its
    /// result was discarded.
    #[error("superseded by a newer session operation")]
    Superseded,

    /// The OAuth provider redirected back with an error or no token.
    #[error("oauth sign-in failed: {0}")]
    OAuth(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl SessionError {
    /// Stable machine-readable code for logs and UI mapping.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Server { .. } => "E_SERVER",
            Self::InvalidToken => "E_INVALID_TOKEN",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Superseded => "E_SUPERSEDED",
            Self::OAuth(_) => "E_OAUTH",
            Self::Config(_) => "E_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether the same request could plausibly succeed if the user tries again.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. } | Self::Rejected { status: 429, .. })
    }

    /// HTTP status carried by the error, if the API answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
