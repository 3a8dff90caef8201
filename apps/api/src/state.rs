use std::sync::Arc;

use sqlx::SqlitePool;

use crate::llm_client::TextModel;
use crate::trends::TrendsClient;
use crate::wizard::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Memoized in production; any `TextModel` in tests.
    pub model: Arc<dyn TextModel>,
    pub trends: TrendsClient,
    pub sessions: SessionStore,
}

#[cfg(test)]
impl AppState {
    /// State backed by `db` and `model`, with trends left unconfigured.
    pub fn for_tests(db: SqlitePool, model: Arc<dyn TextModel>) -> Self {
        let trends = TrendsClient::new(
            "http://127.0.0.1:9/search".to_string(),
            None,
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        Self {
            db,
            model,
            trends,
            sessions: SessionStore::new(),
        }
    }
}
