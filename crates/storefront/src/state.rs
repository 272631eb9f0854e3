//! Application state shared by every caller of the storefront.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::StorefrontConfig;
use crate::db::{self, PgProfileStore};
use crate::services::{CartEngine, SessionManager};
use crate::store::{FileSlots, LocalFallbackStore, MemoryProfileStore, ProfileStore, SlotStore};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Application state shared across all callers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart engine, the session manager and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: CartEngine,
    sessions: SessionManager,
}

impl AppState {
    /// Create a new application state over explicit backends.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        profiles: Arc<dyn ProfileStore>,
        slots: Arc<dyn SlotStore>,
    ) -> Self {
        let local = LocalFallbackStore::new(slots);
        let cart = CartEngine::new(profiles.clone(), local.clone(), config.locks);
        let sessions = SessionManager::new(profiles, local);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart,
                sessions,
            }),
        }
    }

    /// Create application state from configuration.
    ///
    /// Profiles live in `PostgreSQL` when a database URL is configured and in
    /// memory otherwise. The local fallback store is a directory of files.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Database` if the database cannot be reached.
    pub async fn connect(config: StorefrontConfig) -> Result<Self, StateError> {
        let profiles: Arc<dyn ProfileStore> = if let Some(url) = &config.database_url {
            let pool = db::create_pool(url).await?;
            info!("Connected to profile database");
            Arc::new(PgProfileStore::new(pool))
        } else {
            warn!("No database configured, profiles are kept in memory");
            Arc::new(MemoryProfileStore::new())
        };
        let slots = Arc::new(FileSlots::new(config.local_store_dir.clone()));

        Ok(Self::new(config, profiles, slots))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cart engine.
    #[must_use]
    pub fn cart(&self) -> &CartEngine {
        &self.inner.cart
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }
}
