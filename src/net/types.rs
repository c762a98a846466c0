//! JSON DTOs exchanged with the external matching API.
//!
//! DESIGN
//! ======
//! The API speaks camelCase JSON. Response types are lenient (missing profile
//! fields default) because the session core only needs the id, the token,
//! and the profile-complete flag to make routing decisions.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only snapshot of the remote user record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Sign-in email address.
    #[serde(default)]
    pub email: String,
    /// Free-form self description.
    #[serde(default)]
    pub bio: Option<String>,
    /// Skills the user offers to collaborators.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Topics the user wants to collaborate on.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Avatar image URL, if available.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Whether profile setup has been finished.
    #[serde(default)]
    pub profile_complete: bool,
}

/// `POST /auth/login` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Fields accepted by `POST /auth/register`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFields {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
}

/// Partial profile update sent with `PUT /me`. Unset fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_complete: Option<bool>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body returned by login and register.
///
/// The API either nests the user (`{ "token": .., "user": {..} }`) or
/// returns the user fields flat next to the token. Both are accepted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default, alias = "accessToken")]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl AuthResponse {
    /// The user carried by the response, nested or flat. `None` when the body
    /// has no usable user id.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let user = match &self.user {
            Some(user) => user.clone(),
            None => serde_json::from_value(Value::Object(self.rest.clone())).ok()?,
        };
        if user.id.trim().is_empty() { None } else { Some(user) }
    }

    /// The non-empty session token, if present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Token and user together, only when both are usable.
    #[must_use]
    pub fn credentials(&self) -> Option<(String, User)> {
        Some((self.token()?.to_owned(), self.user()?))
    }
}

/// Error body shape; either field may carry the human-readable text.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}
