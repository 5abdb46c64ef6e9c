use std::sync::Arc;

use pastely_db::{Database, ModelError};
use tracing::error;

use crate::error::AppError;
use crate::session::{SessionConfig, SessionManager};

pub type AppState = Arc<AppStateInner>;

/// Dependencies shared by every handler, built once at startup.
pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: SessionManager,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, session_config: SessionConfig) -> AppState {
        let sessions = SessionManager::new(db.clone(), session_config);
        Arc::new(Self { db, sessions })
    }

    /// Runs a store operation on the blocking pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Database) -> Result<T, ModelError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        run_blocking(move || f(&db)).await
    }
}

pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, ModelError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(format!("blocking task failed: {}", e))
        })?
        .map_err(AppError::from)
}
