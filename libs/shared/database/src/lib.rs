pub mod store;

use shared_config::AppConfig;

use crate::store::DocumentStore;

/// Process-wide service handles, constructed once at startup and shared with
/// every router. Nothing in the codebase builds an HTTP client at import time.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: DocumentStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = DocumentStore::new(&config);
        Self { config, store }
    }
}
