use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::registry::RoomRegistry;

/// Configuration for the idle room cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to sweep the registry
    pub sweep_interval: Duration,
    /// How long a room must be quiet before it is purged
    pub max_idle: chrono::Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
            max_idle: chrono::Duration::hours(24),
        }
    }
}

/// Runs the recurring idle-room sweep until the process exits.
///
/// Each sweep executes in its own spawned task: if one sweep panics, the
/// error is logged through the join handle and the next sweep still runs.
#[instrument(skip(registry))]
pub async fn start_cleanup_task(registry: Arc<RoomRegistry>, config: CleanupConfig) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        max_idle_hours = config.max_idle.num_hours(),
        "Starting idle room cleanup task"
    );

    let mut sweep = interval(config.sweep_interval);

    loop {
        sweep.tick().await;

        info!(total_rooms = registry.len(), "Running idle room sweep");

        let registry = Arc::clone(&registry);
        let max_idle = config.max_idle;
        match tokio::spawn(async move { registry.purge_idle(Utc::now(), max_idle) }).await {
            Ok(purged) => {
                info!(purged, "Idle room sweep completed");
            }
            Err(err) => {
                error!(error = %err, "Idle room sweep failed");
            }
        }
    }
}
