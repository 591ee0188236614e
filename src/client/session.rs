// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session store.
//!
//! Follows the identity provider's signed-in state: each time a provider
//! session appears it is exchanged for an API session token, which is kept
//! in [`TokenStorage`]. Signing out of the provider clears everything.

use super::ClientError;
use crate::routes::auth::{SessionResponse, UserResponse};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Signed-in state reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// Provider subject (Firebase UID)
    pub uid: String,
    /// Fresh provider ID token
    pub id_token: String,
}

/// Source of identity provider state changes.
#[async_trait]
pub trait IdentityStateSource: Send + Sync {
    /// Current state plus every later change. `None` means signed out.
    fn subscribe(&self) -> watch::Receiver<Option<ProviderSession>>;

    async fn sign_out(&self) -> Result<(), ClientError>;
}

/// Exchanges provider tokens for API sessions.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn register(&self, provider_token: &str) -> Result<SessionResponse, ClientError>;

    /// Forget any session token held by the backend.
    fn clear(&self) {}
}

/// Persistent home of the session token.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// In-process token storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    fn save(&self, token: &str) {
        *lock(&self.token) = Some(token.to_string());
    }

    fn clear(&self) {
        *lock(&self.token) = None;
    }
}

/// Snapshot of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<UserResponse>,
    /// True until the first provider state has been handled.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

struct Inner {
    backend: Arc<dyn SessionBackend>,
    storage: Arc<dyn TokenStorage>,
    state: watch::Sender<SessionState>,
    active: Mutex<Option<Active>>,
}

struct Active {
    task: AbortHandle,
    source: Arc<dyn IdentityStateSource>,
}

/// Session store shared by the UI. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

/// Handle for a running [`SessionStore::listen`]; dropping it unsubscribes.
#[must_use = "dropping the subscription stops listening"]
pub struct Subscription {
    task: AbortHandle,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>, storage: Arc<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                storage,
                state,
                active: Mutex::new(None),
            }),
        }
    }

    /// Start following `source`. Only one subscription is active per store;
    /// a new call cancels the previous one.
    ///
    /// Must be called within a Tokio runtime.
    pub fn listen(&self, source: Arc<dyn IdentityStateSource>) -> Subscription {
        let mut changes = source.subscribe();
        let store = self.clone();

        let task = tokio::spawn(async move {
            loop {
                let current = changes.borrow_and_update().clone();
                store.handle(current).await;
                if changes.changed().await.is_err() {
                    tracing::debug!("Identity source closed");
                    break;
                }
            }
        })
        .abort_handle();

        let previous = lock(&self.inner.active).replace(Active {
            task: task.clone(),
            source,
        });
        if let Some(previous) = previous {
            tracing::debug!("Replacing existing identity subscription");
            previous.task.abort();
        }

        Subscription { task }
    }

    /// Sign out of the provider, then clear local state.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let source = lock(&self.inner.active)
            .as_ref()
            .map(|a| a.source.clone());
        if let Some(source) = source {
            source.sign_out().await?;
        }
        self.clear();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver for state changes.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn user(&self) -> Option<UserResponse> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Stored session token.
    pub fn token(&self) -> Option<String> {
        self.inner.storage.load()
    }

    async fn handle(&self, session: Option<ProviderSession>) {
        let Some(session) = session else {
            self.clear();
            return;
        };

        match self.inner.backend.register(&session.id_token).await {
            Ok(registered) => {
                self.inner.storage.save(&registered.token);
                tracing::debug!(user_id = %registered.user.id, "Session established");
                self.inner.state.send_replace(SessionState {
                    user: Some(registered.user),
                    loading: false,
                });
            }
            Err(e) => {
                tracing::warn!(uid = %session.uid, error = %e, "Session exchange failed");
                self.clear();
            }
        }
    }

    fn clear(&self) {
        self.inner.storage.clear();
        self.inner.backend.clear();
        self.inner.state.send_replace(SessionState {
            user: None,
            loading: false,
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        tx: watch::Sender<Option<ProviderSession>>,
        sign_outs: AtomicUsize,
    }

    impl FakeSource {
        fn new(initial: Option<ProviderSession>) -> Arc<Self> {
            let (tx, _) = watch::channel(initial);
            Arc::new(Self {
                tx,
                sign_outs: AtomicUsize::new(0),
            })
        }

        fn emit(&self, session: Option<ProviderSession>) {
            self.tx.send_replace(session);
        }
    }

    #[async_trait]
    impl IdentityStateSource for FakeSource {
        fn subscribe(&self) -> watch::Receiver<Option<ProviderSession>> {
            self.tx.subscribe()
        }

        async fn sign_out(&self) -> Result<(), ClientError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            self.tx.send_replace(None);
            Ok(())
        }
    }

    /// Accepts tokens starting with `good-`.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionBackend for FakeBackend {
        async fn register(&self, provider_token: &str) -> Result<SessionResponse, ClientError> {
            lock(&self.calls).push(provider_token.to_string());
            if !provider_token.starts_with("good-") {
                return Err(ClientError::Api {
                    status: 401,
                    message: "Invalid or expired token".to_string(),
                    errors: Vec::new(),
                });
            }
            Ok(SessionResponse {
                user: UserResponse {
                    id: format!("user-{provider_token}"),
                    email: "alice@example.com".to_string(),
                    display_name: None,
                    email_verified: true,
                    created_at: Utc::now(),
                },
                token: format!("session-{provider_token}"),
            })
        }
    }

    fn session(token: &str) -> Option<ProviderSession> {
        Some(ProviderSession {
            uid: "uid-1".to_string(),
            id_token: token.to_string(),
        })
    }

    fn store() -> (SessionStore, Arc<FakeBackend>, Arc<MemoryTokenStorage>) {
        let backend = Arc::new(FakeBackend::default());
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = SessionStore::new(backend.clone(), storage.clone());
        (store, backend, storage)
    }

    async fn settled(store: &SessionStore, pred: impl Fn(&SessionState) -> bool) -> SessionState {
        let mut rx = store.watch();
        let state = rx.wait_for(|s| pred(s)).await.unwrap().clone();
        state
    }

    #[tokio::test]
    async fn test_loading_until_first_event() {
        let (store, _, _) = store();
        assert!(store.is_loading());

        let source = FakeSource::new(None);
        let _sub = store.listen(source);

        let state = settled(&store, |s| !s.loading).await;
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn test_signed_in_exchanges_and_persists_token() {
        let (store, _, storage) = store();
        let source = FakeSource::new(session("good-1"));
        let _sub = store.listen(source);

        let state = settled(&store, |s| s.user.is_some()).await;
        assert_eq!(state.user.unwrap().id, "user-good-1");
        assert_eq!(storage.load().as_deref(), Some("session-good-1"));
        assert_eq!(store.token().as_deref(), Some("session-good-1"));
    }

    #[tokio::test]
    async fn test_exchange_failure_clears_state() {
        let (store, _, storage) = store();
        storage.save("stale");
        let source = FakeSource::new(session("bad"));
        let _sub = store.listen(source);

        let state = settled(&store, |s| !s.loading).await;
        assert!(state.user.is_none());
        assert!(storage.load().is_none());
    }

    #[tokio::test]
    async fn test_provider_sign_out_clears_state() {
        let (store, _, storage) = store();
        let source = FakeSource::new(session("good-1"));
        let _sub = store.listen(source.clone());
        settled(&store, |s| s.user.is_some()).await;

        source.emit(None);

        settled(&store, |s| s.user.is_none()).await;
        assert!(storage.load().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_goes_through_provider() {
        let (store, _, storage) = store();
        let source = FakeSource::new(session("good-1"));
        let _sub = store.listen(source.clone());
        settled(&store, |s| s.user.is_some()).await;

        store.sign_out().await.unwrap();

        assert_eq!(source.sign_outs.load(Ordering::SeqCst), 1);
        assert!(store.user().is_none());
        assert!(storage.load().is_none());
    }

    #[tokio::test]
    async fn test_second_listen_replaces_first() {
        let (store, backend, _) = store();
        let first = FakeSource::new(None);
        let second = FakeSource::new(None);

        let _sub1 = store.listen(first.clone());
        let _sub2 = store.listen(second.clone());

        first.emit(session("good-first"));
        second.emit(session("good-second"));

        let state = settled(&store, |s| s.user.is_some()).await;
        assert_eq!(state.user.unwrap().id, "user-good-second");
        tokio::task::yield_now().await;
        assert!(!lock(&backend.calls).contains(&"good-first".to_string()));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let (store, backend, _) = store();
        let source = FakeSource::new(None);

        let sub = store.listen(source.clone());
        settled(&store, |s| !s.loading).await;
        sub.unsubscribe();

        source.emit(session("good-late"));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert!(store.user().is_none());
        assert!(lock(&backend.calls).is_empty());
    }
}
