use std::sync::Arc;

use crate::config::AppConfig;
use crate::game::{CatalogError, InMemorySessionStore, SessionManager, SessionStore, WordCatalog};
use crate::ws::WsManager;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub sessions: SessionManager,
    pub start_time: std::time::Instant,
    /// Live event fan-out to WebSocket subscribers.
    pub ws: Arc<WsManager>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build state with the configured catalog and an in-memory store.
    pub fn new(config: AppConfig) -> Result<SharedState, CatalogError> {
        let catalog = config.load_catalog()?;
        Ok(Self::with_parts(
            config,
            catalog,
            Arc::new(InMemorySessionStore::new()),
        ))
    }

    /// Build state from explicit collaborators. Committed session changes
    /// are fanned out to WebSocket watchers.
    pub fn with_parts(
        config: AppConfig,
        catalog: WordCatalog,
        store: Arc<dyn SessionStore>,
    ) -> SharedState {
        let ws = WsManager::new();
        let sessions = SessionManager::new(Arc::new(catalog), store, config.max_players)
            .with_observer(ws.clone());
        Arc::new(AppState {
            sessions,
            start_time: std::time::Instant::now(),
            ws,
        })
    }
}
