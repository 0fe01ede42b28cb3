//! Shared per-user state: conversation sessions and active-run registry
//!
//! Both containers are cheap clones over an `Arc<Mutex<..>>` so every clone of
//! the relay observes the same state. Updates arrive strictly sequentially
//! from the polling loop, so the mutexes only guard against the spawned run
//! tasks that tear their own entries down.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::relay::session::ConversationSession;
use crate::types::UserId;

/// All in-flight configuration conversations, keyed by user.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<UserId, ConversationSession>>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace (or create) the session for `user`.
    pub(crate) async fn insert(&self, user: UserId, session: ConversationSession) {
        self.inner.lock().await.insert(user, session);
    }

    /// Drop the session for `user`, if any.
    pub(crate) async fn remove(&self, user: UserId) {
        self.inner.lock().await.remove(&user);
    }

    /// Run `f` against the user's session while holding the lock.
    ///
    /// Answers `None` when the user has no session, leaving `f` uncalled.
    pub(crate) async fn with_session<T>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut ConversationSession) -> T,
    ) -> Option<T> {
        self.inner.lock().await.get_mut(&user).map(f)
    }
}

/// Cancellation tokens of the runs currently executing, keyed by user.
///
/// At most one run per user: [`ActiveRuns::begin`] refuses a second
/// registration until [`ActiveRuns::finish`] has removed the first.
#[derive(Clone, Default)]
pub(crate) struct ActiveRuns {
    inner: Arc<Mutex<HashMap<UserId, CancellationToken>>>,
}

impl ActiveRuns {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a run for `user` and hand back its cancellation token.
    ///
    /// Answers `None` when the user already has a run in flight.
    pub(crate) async fn begin(&self, user: UserId) -> Option<CancellationToken> {
        let mut runs = self.inner.lock().await;
        if runs.contains_key(&user) {
            return None;
        }
        let token = CancellationToken::new();
        runs.insert(user, token.clone());
        Some(token)
    }

    /// Cancel the user's run. Answers whether a running, not-yet-cancelled
    /// run was actually stopped by this call.
    pub(crate) async fn cancel(&self, user: UserId) -> bool {
        match self.inner.lock().await.get(&user) {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether the user currently has a registered run.
    pub(crate) async fn is_active(&self, user: UserId) -> bool {
        self.inner.lock().await.contains_key(&user)
    }

    /// Remove the user's run registration once its task has wound down.
    pub(crate) async fn finish(&self, user: UserId) {
        self.inner.lock().await.remove(&user);
    }
}
