use std::sync::Arc;
use std::time::Duration;

use pastely_db::Database;
use tracing::{debug, info, warn};

/// Background task that drops expired sessions from the store. Expired
/// sessions are already ignored on lookup; this only reclaims space.
pub async fn run_cleanup_loop(db: Arc<Database>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        let task_db = db.clone();
        match tokio::task::spawn_blocking(move || task_db.delete_expired_sessions()).await {
            Ok(Ok(0)) => debug!("Cleanup: no expired sessions"),
            Ok(Ok(count)) => info!("Cleanup: removed {} expired sessions", count),
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task failed: {}", e),
        }
    }
}
