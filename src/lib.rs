//! Client-side session core for the collabmatch app.
//!
//! ARCHITECTURE
//! ============
//! [`store::SessionStore`] owns the only process-wide state: who is signed in
//! and whether their profile is complete. [`guard::RouteGuard`] reads that
//! state on every navigation. Everything else in the client is a downstream
//! reader of the store.
//!
//! The store talks to the outside world through two seams:
//! [`net::api::AuthApi`] for the REST API and [`storage::SessionStorage`] for
//! the token kept between runs. Both are injected, so the store has a plain
//! constructor and an explicit `start`/`shutdown` lifecycle instead of a
//! global.

pub mod config;
pub mod error;
pub mod guard;
pub mod net;
pub mod oauth;
pub mod state;
pub mod storage;
pub mod store;

pub use config::ClientConfig;
pub use error::SessionError;
pub use guard::{GuardDecision, Navigator, Outcome, RouteGuard, RouteRequirement, RouteTable};
pub use net::api::{AuthApi, HttpAuthApi};
pub use net::types::{ProfileUpdate, RegisterFields, User};
pub use state::session::{AuthPhase, AuthenticatedUser, Session};
pub use storage::{FileStorage, MemoryStorage, PersistedSession, SessionStorage};
pub use store::{RegisterOutcome, SessionStore};
