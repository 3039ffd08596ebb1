//! Background jobs for the web server.
//!
//! Two fixed-interval loops: one evicts expired IRR cache entries, the other
//! materializes due scheduled transactions.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Starts the periodic sweep of expired cache entries.
pub fn start_cache_sweeper(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("IRR cache sweeper started ({}s interval)", every.as_secs());
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; nothing can be expired yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = state.irr_cache.sweep_expired();
            if removed > 0 {
                debug!("Swept {} expired IRR cache entries", removed);
            }
        }
    });
}

/// Starts the periodic execution of due scheduled transactions.
pub fn start_scheduled_transaction_runner(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!(
            "Scheduled transaction runner started ({}s interval)",
            every.as_secs()
        );
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_due_schedules(&state).await;
        }
    });
}

async fn run_due_schedules(state: &Arc<AppState>) {
    let today = Utc::now().date_naive();
    match state.scheduled_service.execute_due(today).await {
        Ok(summary) if summary.schedules_due == 0 => {
            debug!("No scheduled transactions due on {}", today);
        }
        Ok(summary) => {
            info!(
                "Scheduled run for {}: {} schedules due, {} activities created, {} completed",
                today, summary.schedules_due, summary.activities_created, summary.schedules_completed
            );
            for failure in &summary.failures {
                warn!(
                    "Scheduled transaction {} failed: {}",
                    failure.scheduled_transaction_id, failure.message
                );
            }
        }
        Err(e) => warn!("Scheduled transaction run failed: {}", e),
    }
}
