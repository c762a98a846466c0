//! Session store: the single source of truth for who is signed in.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SessionStore` is built at application start, handed to whatever needs
//! it (usually behind an `Arc`), and shut down when the application stops.
//! Views and the route guard read [`SessionStore::session`] or follow changes
//! through [`SessionStore::subscribe`].
//!
//! CONCURRENCY
//! ===========
//! Every operation takes a generation number when it starts. Results are
//! committed only if no newer operation has started since, so a slow login
//! can never overwrite a faster one that began after it. `logout` bumps the
//! generation itself and therefore invalidates everything still in flight.
//! Generation bumps and commits both happen inside the watch channel's write
//! lock, so they are totally ordered.
//!
//! Storage writes go through `persist_lock` and happen after the in-memory
//! commit, so storage never holds a session that memory rejected.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::net::api::{AuthApi, HttpAuthApi};
use crate::net::types::{AuthResponse, ProfileUpdate, RegisterFields};
use crate::oauth;
use crate::state::session::{AuthPhase, AuthenticatedUser, Session};
use crate::storage::{FileStorage, PersistedSession, SessionStorage};

/// What `register` produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The API returned a user and token; the session is now active.
    SignedIn(AuthenticatedUser),
    /// The API accepted the registration but returned no usable user id or
    /// token. No session was established and no error is raised; this is
    /// the shape an email-verification flow would produce.
    Pending,
}

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
    generation: AtomicU64,
    persist_lock: Mutex<()>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self { api, storage, state, generation: AtomicU64::new(0), persist_lock: Mutex::new(()) }
    }

    /// Store backed by the HTTP API and a session file, both from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        let api = HttpAuthApi::new(config)?;
        let storage = FileStorage::new(config.session_file.clone());
        Ok(Self::new(Arc::new(api), Arc::new(storage)))
    }

    // =========================================================================
    // READ SIDE
    // =========================================================================

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.state.borrow().phase()
    }

    #[must_use]
    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Receiver notified on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Application start: resume whatever session the last run persisted.
    pub async fn start(&self) -> Session {
        tracing::debug!("session store starting");
        self.restore().await
    }

    /// Application stop: drop in-memory state and invalidate anything in
    /// flight. Persisted storage is left alone so the next start restores it.
    pub fn shutdown(&self) {
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *session = Session::default();
        });
        tracing::debug!("session store shut down");
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Resume a persisted session.
    ///
    /// Any failure (unreadable storage, rejected token, unreachable API)
    /// clears persisted data and leaves the session empty. Failures are
    /// logged, never returned; calling again repeats the same outcome.
    pub async fn restore(&self) -> Session {
        let generation = self.begin();

        let persisted = match self.storage.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "persisted session unreadable; clearing");
                self.reset_if_current(generation).await;
                return self.session();
            }
        };
        let Some(PersistedSession { token, user: cached }) = persisted else {
            self.reset_if_current(generation).await;
            return self.session();
        };

        let restored = match self.fetch_current_user(&token, &cached).await {
            Ok(user) => {
                let user_id = user.id.clone();
                self.commit_and_persist(generation, token, user).await.map(|()| user_id)
            }
            Err(e) => Err(e),
        };
        match restored {
            Ok(user_id) => tracing::info!(%user_id, "session restored"),
            Err(SessionError::Superseded) => {}
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session restore failed; clearing");
                self.reset_if_current(generation).await;
            }
        }
        self.session()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the API's error (message passed through) without changing the
    /// session, or [`SessionError::Superseded`] if a newer operation started
    /// before this one finished.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, SessionError> {
        let generation = self.begin();
        let response = self.settle_on_err(generation, self.api.login(email, password).await)?;
        let Some((token, user)) = response.credentials() else {
            self.settle(generation);
            return Err(SessionError::Decode("login response missing user id or token".to_owned()));
        };
        self.commit_and_persist(generation, token, user.clone()).await?;
        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Create an account.
    ///
    /// A response with no user id or token yields [`RegisterOutcome::Pending`]
    /// instead of an error.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionStore::login`].
    pub async fn register(&self, fields: &RegisterFields) -> Result<RegisterOutcome, SessionError> {
        let generation = self.begin();
        let response: AuthResponse = self.settle_on_err(generation, self.api.register(fields).await)?;
        let Some((token, user)) = response.credentials() else {
            tracing::warn!(
                has_user = response.user().is_some(),
                has_token = response.token().is_some(),
                "register succeeded without a usable user id and token; no session established"
            );
            self.settle(generation);
            return Ok(RegisterOutcome::Pending);
        };
        self.commit_and_persist(generation, token, user.clone()).await?;
        tracing::info!(user_id = %user.id, "registered and signed in");
        Ok(RegisterOutcome::SignedIn(user))
    }

    /// Finish an OAuth sign-in from the provider's callback URL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::OAuth`] for a provider error or missing token,
    /// otherwise the same contract as [`SessionStore::login`].
    pub async fn complete_oauth(&self, callback_url: &str) -> Result<AuthenticatedUser, SessionError> {
        let token = oauth::parse_callback(callback_url)?;
        let generation = self.begin();
        let user = self.settle_on_err(generation, self.api.me(&token).await)?;
        self.commit_and_persist(generation, token, user.clone()).await?;
        tracing::info!(user_id = %user.id, "signed in via oauth");
        Ok(user)
    }

    /// Update the signed-in user's profile with `PUT /me`.
    ///
    /// Setting `profile_complete` here is what moves the session from
    /// authenticated-incomplete to authenticated-complete.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a session; otherwise the
    /// same contract as [`SessionStore::login`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthenticatedUser, SessionError> {
        let Some(token) = self.state.borrow().auth_token().map(str::to_owned) else {
            return Err(SessionError::NotAuthenticated);
        };
        let generation = self.begin();
        let user = self.settle_on_err(generation, self.api.update_me(&token, update).await)?;

        let _persist = self.persist_lock.lock().await;
        let mut replaced = true;
        let committed = self.state.send_if_modified(|session| {
            if !self.is_current(generation) {
                return false;
            }
            replaced = session.replace_user(user.clone());
            session.set_loading(false);
            true
        });
        if !committed {
            return Err(SessionError::Superseded);
        }
        if !replaced {
            return Err(SessionError::Decode(format!("profile update returned a different user ({})", user.id)));
        }
        self.persist(&PersistedSession { token, user: user.clone() }).await;
        tracing::info!(user_id = %user.id, profile_complete = user.profile_complete, "profile updated");
        Ok(user)
    }

    /// Sign out.
    ///
    /// Local state and persisted storage are cleared unconditionally. The
    /// remote call is fire-and-forget: its failure is logged, not returned.
    /// Without an in-memory session the persisted token is the one revoked,
    /// so logout works on a store that was never started.
    ///
    /// Storage is cleared before the remote call, and skipped when a newer
    /// sign-in has already committed, so a slow remote logout never erases a
    /// session that replaced it.
    pub async fn logout(&self) {
        let mut token = None;
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            token = session.auth_token().map(str::to_owned);
            *session = Session::default();
        });

        {
            let _persist = self.persist_lock.lock().await;
            let replaced = self.state.borrow().is_authenticated();
            if !replaced {
                if token.is_none() {
                    token = match self.storage.load().await {
                        Ok(persisted) => persisted.map(|p| p.token),
                        Err(e) => {
                            tracing::warn!(error = %e, "persisted session unreadable during logout");
                            None
                        }
                    };
                }
                if let Err(e) = self.storage.clear().await {
                    tracing::warn!(error = %e, "failed to clear persisted session");
                }
            }
        }

        if let Some(token) = token {
            if let Err(e) = self.api.logout(&token).await {
                tracing::warn!(error = %e, "remote logout failed; local session cleared anyway");
            }
        }
        tracing::info!("signed out");
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Start an operation: bump the generation and raise the loading flag.
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|session| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            session.set_loading(true);
        });
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Lower the loading flag if `generation` is still the newest operation.
    fn settle(&self, generation: u64) {
        self.state.send_if_modified(|session| {
            if !self.is_current(generation) || !session.is_loading() {
                return false;
            }
            session.set_loading(false);
            true
        });
    }

    fn settle_on_err<T>(&self, generation: u64, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if result.is_err() {
            self.settle(generation);
        }
        result
    }

    /// Validate a persisted token. The cached snapshot must belong to the
    /// same user the API reports, otherwise the token is treated as stale.
    async fn fetch_current_user(
        &self,
        token: &str,
        cached: &AuthenticatedUser,
    ) -> Result<AuthenticatedUser, SessionError> {
        let user = self.api.me(token).await.map_err(|e| match e {
            SessionError::Rejected { status: 401 | 403, .. } => SessionError::InvalidToken,
            other => other,
        })?;
        if !cached.id.is_empty() && cached.id != user.id {
            return Err(SessionError::InvalidToken);
        }
        Ok(user)
    }

    async fn commit_and_persist(
        &self,
        generation: u64,
        token: String,
        user: AuthenticatedUser,
    ) -> Result<(), SessionError> {
        let Some(next) = Session::authenticated(token.clone(), user.clone()) else {
            self.settle(generation);
            return Err(SessionError::Decode("blank user id or token".to_owned()));
        };

        let _persist = self.persist_lock.lock().await;
        let committed = self.state.send_if_modified(|session| {
            if !self.is_current(generation) {
                return false;
            }
            *session = next;
            true
        });
        if !committed {
            tracing::debug!(generation, "discarding superseded session result");
            return Err(SessionError::Superseded);
        }
        self.persist(&PersistedSession { token, user }).await;
        Ok(())
    }

    /// Empty the session and storage, unless a newer operation owns them now.
    async fn reset_if_current(&self, generation: u64) {
        let _persist = self.persist_lock.lock().await;
        let reset = self.state.send_if_modified(|session| {
            if !self.is_current(generation) {
                return false;
            }
            *session = Session::default();
            true
        });
        if !reset {
            return;
        }
        if let Err(e) = self.storage.clear().await {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Caller holds `persist_lock`. A write failure only costs the next
    /// start its restore, so it is logged rather than returned.
    async fn persist(&self, record: &PersistedSession) {
        if let Err(e) = self.storage.save(record).await {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }
}
