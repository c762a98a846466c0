//! Auth-session state for the current client user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by the route guard and by any view that renders identity-dependent
//! content. Only `SessionStore` constructs non-empty sessions.
//!
//! DESIGN
//! ======
//! The token and the user snapshot live in one `Option`, so a session with a
//! user id but no token (or the reverse) cannot be built.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::net::types::User;

/// Snapshot of the remote user record cached with the session.
pub type AuthenticatedUser = User;

/// Where the current client stands for routing purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthPhase {
    Unauthenticated,
    AuthenticatedIncomplete,
    AuthenticatedComplete,
}

impl AuthPhase {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthenticatedIncomplete => "authenticated-incomplete",
            Self::AuthenticatedComplete => "authenticated-complete",
        }
    }
}

impl std::fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Identity {
    token: String,
    user: AuthenticatedUser,
}

/// The client's belief about the current authenticated identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    loading: bool,
}

impl Session {
    /// An active session. Returns `None` when the token or user id is blank.
    #[must_use]
    pub(crate) fn authenticated(token: String, user: AuthenticatedUser) -> Option<Self> {
        if token.trim().is_empty() || user.id.trim().is_empty() {
            return None;
        }
        Some(Self { identity: Some(Identity { token, user }), loading: false })
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.user.id.as_str())
    }

    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }

    #[must_use]
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.identity.as_ref().map(|i| &i.user)
    }

    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.user.profile_complete)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match &self.identity {
            None => AuthPhase::Unauthenticated,
            Some(i) if i.user.profile_complete => AuthPhase::AuthenticatedComplete,
            Some(_) => AuthPhase::AuthenticatedIncomplete,
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Swap in a fresher snapshot of the same user. Returns `false` and leaves
    /// the session untouched when there is no identity or the id differs.
    pub(crate) fn replace_user(&mut self, user: AuthenticatedUser) -> bool {
        match &mut self.identity {
            Some(identity) if identity.user.id == user.id => {
                identity.user = user;
                true
            }
            _ => false,
        }
    }
}
