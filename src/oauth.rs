//! OAuth callback parsing.
//!
//! The provider redirects back to `/auth/callback` with either `token=..` or
//! `error=..[&error_description=..]`, in the query string or the fragment.
//! Relative callback paths are accepted.

#[cfg(test)]
#[path = "oauth_test.rs"]
mod oauth_test;

use reqwest::Url;

use crate::error::SessionError;

pub const CALLBACK_PATH: &str = "/auth/callback";

/// Extract the session token from an OAuth callback URL.
///
/// # Errors
///
/// Returns [`SessionError::OAuth`] when the URL is malformed, carries a
/// provider error, or has no token.
pub fn parse_callback(raw: &str) -> Result<String, SessionError> {
    let base = Url::parse("http://localhost/").map_err(|e| SessionError::OAuth(e.to_string()))?;
    let url = base
        .join(raw.trim())
        .map_err(|e| SessionError::OAuth(format!("malformed callback url: {e}")))?;

    let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        let mut frag_url = base.clone();
        frag_url.set_query(Some(fragment));
        params.extend(frag_url.query_pairs().into_owned());
    }
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_owned())
    };

    if let Some(error) = get("error") {
        let message = match get("error_description") {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(SessionError::OAuth(message));
    }
    get("token")
        .or_else(|| get("access_token"))
        .ok_or_else(|| SessionError::OAuth("callback carried no token".to_owned()))
}
