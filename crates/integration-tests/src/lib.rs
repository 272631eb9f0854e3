//! Integration tests for `EcoFinds`.
//!
//! Scenarios run against the in-memory profile store and a file-backed local
//! store in a temporary directory, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecofinds-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use ecofinds_storefront::config::StorefrontConfig;
use ecofinds_storefront::state::AppState;
use ecofinds_storefront::store::{FileSlots, MemoryProfileStore};

/// Application state over fresh backends, plus handles to inspect them.
pub struct TestContext {
    pub state: AppState,
    pub profiles: Arc<MemoryProfileStore>,
    pub local_dir: PathBuf,
}

impl TestContext {
    /// Build a context with an empty profile store and a unique local store
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        let local_dir =
            std::env::temp_dir().join(format!("ecofinds-it-{}", uuid::Uuid::new_v4()));
        Self::with_local_dir(local_dir)
    }

    /// Build a context whose local store lives in `local_dir`.
    #[must_use]
    pub fn with_local_dir(local_dir: PathBuf) -> Self {
        let profiles = Arc::new(MemoryProfileStore::new());
        let config = StorefrontConfig {
            local_store_dir: local_dir.clone(),
            ..StorefrontConfig::default()
        };
        let state = AppState::new(
            config,
            profiles.clone(),
            Arc::new(FileSlots::new(local_dir.clone())),
        );

        Self {
            state,
            profiles,
            local_dir,
        }
    }
}

impl TestContext {
    /// Fresh application state over the same backends, as after a restart.
    #[must_use]
    pub fn reopen(&self) -> AppState {
        AppState::new(
            self.state.config().clone(),
            self.profiles.clone(),
            Arc::new(FileSlots::new(self.local_dir.clone())),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.local_dir);
    }
}
