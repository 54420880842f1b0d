//! Application state for the REST API.
//!
//! Handlers share one [`ResourceRepository`] (and with it one lock table)
//! plus the server configuration.

use std::sync::Arc;

use helios_vstore::core::VersionStore;
use helios_vstore::repository::ResourceRepository;

use crate::config::ServerConfig;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The storage backend type (must implement [`VersionStore`])
pub struct AppState<S> {
    /// The versioned repository.
    repository: Arc<ResourceRepository<S>>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: VersionStore> AppState<S> {
    /// Creates a new AppState over `store`.
    pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
        Self {
            repository: Arc::new(ResourceRepository::from_arc(store)),
            config: Arc::new(config),
        }
    }

    /// Returns the repository.
    pub fn repository(&self) -> &ResourceRepository<S> {
        &self.repository
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the base URL for the server, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Returns whether PUT may create absent resources.
    pub fn update_create_enabled(&self) -> bool {
        self.config.update_create_enabled
    }

    /// Returns whether DELETE is supported.
    pub fn delete_enabled(&self) -> bool {
        self.config.delete_enabled
    }

    /// Returns the history page size for a requested `_count`.
    pub fn history_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_history_count)
            .min(self.config.max_history_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios_vstore::backends::memory::InMemoryStore;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new(Arc::new(InMemoryStore::new()), ServerConfig::default());

        assert_eq!(state.repository().backend_name(), "memory");
        assert_eq!(state.base_url(), "http://localhost:8080");
        assert!(state.delete_enabled());
    }

    #[test]
    fn test_history_count_is_clamped() {
        let config = ServerConfig {
            default_history_count: 20,
            max_history_count: 50,
            ..Default::default()
        };
        let state = AppState::new(Arc::new(InMemoryStore::new()), config);

        assert_eq!(state.history_count(None), 20);
        assert_eq!(state.history_count(Some(5)), 5);
        assert_eq!(state.history_count(Some(500)), 50);
    }

    #[test]
    fn test_app_state_clone_shares_repository() {
        let state = AppState::new(Arc::new(InMemoryStore::new()), ServerConfig::default());
        let cloned = state.clone();

        assert!(std::ptr::eq(state.repository(), cloned.repository()));
    }
}
