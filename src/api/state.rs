use std::sync::Arc;

use crate::refresh::{RefreshKey, RefreshWorker};
use crate::storage::TableStore;

#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<dyn TableStore>,
    pub refresh: Arc<RefreshWorker>,
    pub refresh_key: Arc<RefreshKey>,
}

impl AppState {
    pub fn new(
        tables: Arc<dyn TableStore>,
        refresh: Arc<RefreshWorker>,
        refresh_key: RefreshKey,
    ) -> Self {
        Self {
            tables,
            refresh,
            refresh_key: Arc::new(refresh_key),
        }
    }
}
