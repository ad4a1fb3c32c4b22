use std::sync::Arc;

use tracing::error;

use eclipse_db::{Database, StoreError};
use eclipse_media::MediaStore;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub media: MediaStore,
}

/// Run a blocking DB operation off the async runtime.
pub(crate) async fn run_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("blocking task join error: {e}");
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
