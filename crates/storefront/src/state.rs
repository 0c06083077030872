//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{PgCatalog, PgDatabase};
use crate::demo::DemoSessionStore;
use crate::services::CheckoutPricing;
use crate::store::Storage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    storage: Storage,
}

impl AppState {
    /// Create a new application state backed by `PostgreSQL`.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let storage = Storage::new(
            Arc::new(PgCatalog::new(pool.clone())),
            Arc::new(PgDatabase::new(pool.clone())),
            DemoSessionStore::new(&config.demo),
        );
        Self::with_storage(config, pool, storage)
    }

    /// Create application state over an explicit storage resolver.
    #[must_use]
    pub fn with_storage(config: StorefrontConfig, pool: PgPool, storage: Storage) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storage,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the storage resolver.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Get a reference to the checkout pricing rules.
    #[must_use]
    pub fn pricing(&self) -> &CheckoutPricing {
        &self.inner.config.pricing
    }
}
