//! REST calls to the external matching API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` talks to the API only through the [`AuthApi`] trait so tests
//! and alternative transports can stand in for [`HttpAuthApi`].
//!
//! ERROR HANDLING
//! ==============
//! Any non-2xx answer is a failure. The server's `message` (or `error`) field
//! is passed through untouched; when the body has neither, a generic
//! `"<op> failed: <status>"` message is used instead.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::types::{ApiErrorBody, AuthResponse, LoginRequest, ProfileUpdate, RegisterFields, User};
use crate::config::{ClientConfig, Timeouts};
use crate::error::SessionError;

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout";
pub(crate) const ME_PATH: &str = "/me";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// The API operations the session core depends on.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError>;

    /// `POST /auth/register`.
    async fn register(&self, fields: &RegisterFields) -> Result<AuthResponse, SessionError>;

    /// `GET /me` with `token`.
    async fn me(&self, token: &str) -> Result<User, SessionError>;

    /// `PUT /me` with `token`.
    async fn update_me(&self, token: &str, update: &ProfileUpdate) -> Result<User, SessionError>;

    /// `POST /auth/logout` with `token`.
    async fn logout(&self, token: &str) -> Result<(), SessionError>;
}

/// [`AuthApi`] over HTTPS with bearer-token auth.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, SessionError> {
        Self::with_timeouts(&config.api_url, config.timeouts)
    }

    /// Build a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_timeouts(base_url: &str, timeouts: Timeouts) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: crate::config::normalize_base_url(base_url) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> (Uuid, RequestBuilder) {
        let request_id = Uuid::new_v4();
        let url = endpoint(&self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        (request_id, builder)
    }

    async fn send_json<T, B>(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self.send(op, method, path, token, body).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SessionError::Decode(format!("{op}: {e}")))
    }

    async fn send<B>(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<Response, SessionError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let (request_id, builder) = self.request(method, path, token);
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };

        tracing::debug!(%request_id, op, path, "api request");
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%request_id, op, error = %e, "api transport failure");
            SessionError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let err = error_from_response(op, status, &text);
        tracing::debug!(%request_id, op, status = status.as_u16(), error = %err, "api request rejected");
        Err(err)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, SessionError> {
        let body = LoginRequest { email, password };
        self.send_json("login", Method::POST, LOGIN_PATH, None, Some(&body)).await
    }

    async fn register(&self, fields: &RegisterFields) -> Result<AuthResponse, SessionError> {
        self.send_json("register", Method::POST, REGISTER_PATH, None, Some(fields)).await
    }

    async fn me(&self, token: &str) -> Result<User, SessionError> {
        self.send_json::<User, ()>("fetch user", Method::GET, ME_PATH, Some(token), None)
            .await
    }

    async fn update_me(&self, token: &str, update: &ProfileUpdate) -> Result<User, SessionError> {
        self.send_json("update profile", Method::PUT, ME_PATH, Some(token), Some(update))
            .await
    }

    async fn logout(&self, token: &str) -> Result<(), SessionError> {
        self.send::<()>("logout", Method::POST, LOGOUT_PATH, Some(token), None)
            .await
            .map(|_| ())
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn failed_message(op: &str, status: u16) -> String {
    format!("{op} failed: {status}")
}

/// Map a non-2xx answer onto the error taxonomy.
pub(crate) fn error_from_response(op: &str, status: StatusCode, body: &str) -> SessionError {
    let code = status.as_u16();
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.text().map(str::to_owned))
        .unwrap_or_else(|| failed_message(op, code));
    if status.is_server_error() {
        SessionError::Server { status: code, message }
    } else {
        SessionError::Rejected { status: code, message }
    }
}
