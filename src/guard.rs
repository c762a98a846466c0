//! Route guard: decides per navigation whether to render or redirect.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every view declares a [`RouteRequirement`]. The guard compares it with the
//! session's [`AuthPhase`] and nothing else, so the same table drives both
//! first navigation and re-evaluation after a session change.
//!
//! While the session is loading, protected routes answer
//! [`GuardDecision::Wait`] instead of redirecting; a restore in progress must
//! not bounce a signed-in user to `/login`.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::state::session::{AuthPhase, Session};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const SETUP_PROFILE_PATH: &str = "/setup-profile";
pub const HOME_PATH: &str = "/discover";

const MAX_REDIRECTS: usize = 4;

/// What a route needs from the session before it may render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Anyone, in any phase.
    Public,
    /// Only signed-out visitors (login, register).
    GuestOnly,
    /// Any signed-in user, complete profile or not.
    Authenticated,
    /// Signed-in users who finished profile setup.
    ProfileComplete,
}

/// Outcome of a single guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
    /// Session is still loading; render a waiting state and check again.
    Wait,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("redirect loop while navigating to {0}")]
    RedirectLoop(String),
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
struct Route {
    segments: Vec<String>,
    requirement: RouteRequirement,
}

/// Ordered list of route patterns. First match wins; unmatched paths are
/// [`RouteRequirement::Public`] so the caller can render its own 404.
///
/// Patterns use `/`-separated segments; `:name` matches any one segment and
/// a trailing `*` matches the rest of the path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
    login_path: String,
    setup_path: String,
    home_path: String,
}

impl RouteTable {
    /// Empty table with the given redirect destinations.
    #[must_use]
    pub fn new(login_path: &str, setup_path: &str, home_path: &str) -> Self {
        Self {
            routes: Vec::new(),
            login_path: login_path.to_owned(),
            setup_path: setup_path.to_owned(),
            home_path: home_path.to_owned(),
        }
    }

    /// Append a route.
    #[must_use]
    pub fn route(mut self, pattern: &str, requirement: RouteRequirement) -> Self {
        self.routes.push(Route { segments: split_path(pattern), requirement });
        self
    }

    /// Requirement declared for `path` (query and fragment ignored).
    #[must_use]
    pub fn requirement_for(&self, path: &str) -> RouteRequirement {
        let segments = split_path(path);
        self.routes
            .iter()
            .find(|route| segments_match(&route.segments, &segments))
            .map_or(RouteRequirement::Public, |route| route.requirement)
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn setup_path(&self) -> &str {
        &self.setup_path
    }

    #[must_use]
    pub fn home_path(&self) -> &str {
        &self.home_path
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(LOGIN_PATH, SETUP_PROFILE_PATH, HOME_PATH)
            .route("/", RouteRequirement::Public)
            .route(LOGIN_PATH, RouteRequirement::GuestOnly)
            .route(REGISTER_PATH, RouteRequirement::GuestOnly)
            .route(crate::oauth::CALLBACK_PATH, RouteRequirement::Public)
            .route(SETUP_PROFILE_PATH, RouteRequirement::Authenticated)
            .route(HOME_PATH, RouteRequirement::ProfileComplete)
            .route("/matches", RouteRequirement::ProfileComplete)
            .route("/chat/:id", RouteRequirement::ProfileComplete)
            .route("/profile", RouteRequirement::ProfileComplete)
            .route("/profile/*", RouteRequirement::ProfileComplete)
    }
}

fn split_path(path: &str) -> Vec<String> {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn segments_match(pattern: &[String], path: &[String]) -> bool {
    if let Some((last, head)) = pattern.split_last() {
        if last == "*" {
            return path.len() >= head.len() && segments_match(head, &path[..head.len()]);
        }
    }
    pattern.len() == path.len()
        && pattern
            .iter()
            .zip(path)
            .all(|(p, s)| p.starts_with(':') || p == s)
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Check `path` against the current session.
    #[must_use]
    pub fn check(&self, session: &Session, path: &str) -> GuardDecision {
        self.decide(session.phase(), session.is_loading(), path)
    }

    /// Check `path` for an explicit phase.
    #[must_use]
    pub fn decide(&self, phase: AuthPhase, loading: bool, path: &str) -> GuardDecision {
        let requirement = self.table.requirement_for(path);
        if requirement == RouteRequirement::Public {
            return GuardDecision::Render;
        }
        if loading {
            return GuardDecision::Wait;
        }
        let redirect = |to: &str| GuardDecision::Redirect(to.to_owned());
        match (requirement, phase) {
            (RouteRequirement::Authenticated | RouteRequirement::ProfileComplete, AuthPhase::Unauthenticated) => {
                redirect(&self.table.login_path)
            }
            (RouteRequirement::ProfileComplete, AuthPhase::AuthenticatedIncomplete)
            | (RouteRequirement::GuestOnly, AuthPhase::AuthenticatedIncomplete) => redirect(&self.table.setup_path),
            (RouteRequirement::GuestOnly, AuthPhase::AuthenticatedComplete) => redirect(&self.table.home_path),
            _ => GuardDecision::Render,
        }
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Where navigation settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Render the view at this path.
    Render(String),
    /// Show a waiting state for this path until the session settles.
    Wait(String),
}

impl Outcome {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Render(path) | Self::Wait(path) => path,
        }
    }
}

/// Current location plus the guard, re-checked whenever the session changes.
///
/// When a protected path bounces to the login page the original destination
/// is remembered and resumed once the user signs in.
#[derive(Clone, Debug)]
pub struct Navigator {
    guard: RouteGuard,
    location: Outcome,
    return_to: Option<String>,
}

impl Navigator {
    #[must_use]
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard, location: Outcome::Render("/".to_owned()), return_to: None }
    }

    #[must_use]
    pub fn location(&self) -> &Outcome {
        &self.location
    }

    #[must_use]
    pub fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref()
    }

    /// Navigate to `path`, following guard redirects.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::RedirectLoop`] when the route table redirects
    /// more than a handful of times without settling.
    pub fn navigate(&mut self, session: &Session, path: &str) -> Result<&Outcome, RouteError> {
        let mut target = path.to_owned();
        for _ in 0..=MAX_REDIRECTS {
            match self.guard.check(session, &target) {
                GuardDecision::Render => {
                    tracing::debug!(path = %target, phase = %session.phase(), "render");
                    if target != self.guard.table.login_path {
                        self.clear_return_to_if_reached(&target);
                    }
                    self.location = Outcome::Render(target);
                    return Ok(&self.location);
                }
                GuardDecision::Wait => {
                    self.location = Outcome::Wait(target);
                    return Ok(&self.location);
                }
                GuardDecision::Redirect(next) => {
                    tracing::debug!(from = %target, to = %next, phase = %session.phase(), "guard redirect");
                    if next == self.guard.table.login_path {
                        self.return_to = Some(target);
                    }
                    target = self.resume_target(session, next);
                }
            }
        }
        Err(RouteError::RedirectLoop(path.to_owned()))
    }

    /// Re-check the current location after a session change.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::navigate`].
    pub fn sync(&mut self, session: &Session) -> Result<&Outcome, RouteError> {
        let current = self.location.path().to_owned();
        self.navigate(session, &current)
    }

    /// After sign-in, the home redirect away from a guest page is replaced by
    /// the remembered destination.
    fn resume_target(&mut self, session: &Session, next: String) -> String {
        if session.phase() == AuthPhase::AuthenticatedComplete && next == self.guard.table.home_path {
            if let Some(pending) = self.return_to.take() {
                return pending;
            }
        }
        next
    }

    fn clear_return_to_if_reached(&mut self, target: &str) {
        if self.return_to.as_deref() == Some(target) {
            self.return_to = None;
        }
    }
}
