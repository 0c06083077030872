//! In-memory storage for demo identities.
//!
//! Every demo identity gets a lazily created [`DemoSession`] holding its
//! profile, cart, wishlist, orders, payments and reviews. Sessions live in a
//! bounded `moka` cache: idle sessions expire and the least recently used are
//! evicted once `max_sessions` is reached. Nothing here is ever written to
//! the database.

mod session;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use thiserror::Error;
use tracing::{debug, instrument};

use bazaar_core::identity::{demo_email_for, demo_user_id_for, is_demo_user_id};
use bazaar_core::{Email, EmailError, IdentityError, UserId};

pub use session::DemoSession;

use crate::models::User;

/// Default cap on live sessions.
pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;
/// Default idle lifetime of a session.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Errors raised by the demo session store.
#[derive(Debug, Error)]
pub enum DemoStoreError {
    /// A persisted identity was routed to the demo store.
    #[error("not a demo identity: {0}")]
    NotADemoIdentity(UserId),

    /// The demo id does not map back to a demo address.
    #[error("invalid demo identity: {0}")]
    Identity(#[from] IdentityError),

    /// The derived demo address failed to parse.
    #[error("invalid demo address: {0}")]
    Email(#[from] EmailError),
}

/// Sizing for the session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSessionConfig {
    pub max_sessions: u64,
    pub idle_ttl: Duration,
}

impl Default for DemoSessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

/// Process-wide registry of demo sessions. Cheap to clone.
#[derive(Clone)]
pub struct DemoSessionStore {
    sessions: Cache<UserId, Arc<DemoSession>>,
}

impl DemoSessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: &DemoSessionConfig) -> Self {
        let sessions = Cache::builder()
            .name("demo-sessions")
            .max_capacity(config.max_sessions)
            .time_to_idle(config.idle_ttl)
            .eviction_listener(
                |user_id: Arc<UserId>, _session: Arc<DemoSession>, cause: RemovalCause| {
                    debug!(user_id = %user_id, ?cause, "Demo session evicted");
                },
            )
            .build();

        Self { sessions }
    }

    /// The session for `user_id`, creating it on first use.
    ///
    /// Concurrent first calls for the same id all receive the same session.
    ///
    /// # Errors
    ///
    /// Returns `DemoStoreError::NotADemoIdentity` for non-demo ids.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create(
        &self,
        user_id: &UserId,
    ) -> Result<Arc<DemoSession>, DemoStoreError> {
        if !is_demo_user_id(user_id) {
            return Err(DemoStoreError::NotADemoIdentity(user_id.clone()));
        }
        let email = Email::parse(&demo_email_for(user_id)?)?;

        let session = self
            .sessions
            .get_with(user_id.clone(), async {
                debug!("Demo session created");
                Arc::new(DemoSession::new(User::demo(user_id.clone(), email)))
            })
            .await;

        Ok(session)
    }

    /// The session for a demo email address, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `DemoStoreError::Identity` if `email` is not a demo address.
    pub async fn open(&self, email: &str) -> Result<Arc<DemoSession>, DemoStoreError> {
        let user_id = demo_user_id_for(email)?;
        self.get_or_create(&user_id).await
    }

    /// The session for `user_id`, if one is live. Never creates.
    pub async fn get(&self, user_id: &UserId) -> Option<Arc<DemoSession>> {
        self.sessions.get(user_id).await
    }

    /// Drop a session and everything in it.
    pub async fn invalidate(&self, user_id: &UserId) {
        self.sessions.invalidate(user_id).await;
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }
}

impl Default for DemoSessionStore {
    fn default() -> Self {
        Self::new(&DemoSessionConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::ProductId;

    use super::session::tests::{order, review};
    use super::*;

    #[tokio::test]
    async fn test_concurrent_first_access_shares_one_session() {
        let store = DemoSessionStore::default();
        let user_id = UserId::new("demo-shared");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let user_id = user_id.clone();
                tokio::spawn(async move { store.get_or_create(&user_id).await.unwrap() })
            })
            .collect();

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }
        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_lose_nothing() {
        const WRITERS: usize = 24;
        let store = DemoSessionStore::default();
        let user_id = UserId::new("demo-busy");

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = store.clone();
                let user_id = user_id.clone();
                tokio::spawn(async move {
                    let session = store.get_or_create(&user_id).await.unwrap();
                    let now = chrono::Utc::now();
                    session.save_order(order(&format!("o-{i}"), now));
                    session.save_review(review(&format!("r-{i}"), &format!("p-{i}"), now));
                    session.wishlist_add(ProductId::new(format!("p-{i}")));
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get(&user_id).await.unwrap();
        assert_eq!(store.session_count().await, 1);
        assert_eq!(session.list_orders().len(), WRITERS);
        assert_eq!(session.wishlist().len(), WRITERS);
        for i in 0..WRITERS {
            let product = ProductId::new(format!("p-{i}"));
            assert_eq!(session.reviews_for_product(&product).len(), 1);
            assert!(session.has_reviewed(&product));
        }
    }

    #[tokio::test]
    async fn test_rejects_persisted_ids() {
        let store = DemoSessionStore::default();
        let err = store
            .get_or_create(&UserId::new("1f7c0c52"))
            .await
            .unwrap_err();
        assert!(matches!(err, DemoStoreError::NotADemoIdentity(_)));
    }

    #[tokio::test]
    async fn test_open_by_email_uses_derived_id() {
        let store = DemoSessionStore::default();
        let session = store.open("DEMO@bazaar.local").await.unwrap();
        assert_eq!(session.user_id().as_str(), "demo-legacy");
        assert_eq!(session.profile().display_name(), "Demo User");

        let again = store.get(&UserId::new("demo-legacy")).await.unwrap();
        assert!(Arc::ptr_eq(&session, &again));
    }

    #[tokio::test]
    async fn test_get_never_creates() {
        let store = DemoSessionStore::default();
        assert!(store.get(&UserId::new("demo-nobody")).await.is_none());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_drops_data() {
        let store = DemoSessionStore::default();
        let user_id = UserId::new("demo-gone");
        let session = store.get_or_create(&user_id).await.unwrap();
        session.wishlist_add(ProductId::new("p-1"));

        store.invalidate(&user_id).await;
        let fresh = store.get_or_create(&user_id).await.unwrap();
        assert!(fresh.wishlist().is_empty());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = DemoSessionStore::new(&DemoSessionConfig {
            max_sessions: 10,
            idle_ttl: Duration::from_millis(50),
        });
        let user_id = UserId::new("demo-idle");
        store.get_or_create(&user_id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.get(&user_id).await.is_none());
    }
}
