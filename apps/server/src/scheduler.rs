//! Background scheduler for periodic exchange rate refresh.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Starts the background rate refresh. The first tick waits a full period
/// since startup already brought the rates up to date.
pub fn start_rate_refresh_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Rate refresh scheduler started ({:?} interval)", every);

        let mut ticks = interval(every);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticks.tick().await;

        loop {
            ticks.tick().await;
            run_scheduled_refresh(&state).await;
        }
    });
}

/// Refreshes only when the cached set is stale.
async fn run_scheduled_refresh(state: &Arc<AppState>) {
    let outcome = state.fx_service.ensure_fresh().await;
    match (&outcome.error, outcome.from_cache) {
        (Some(error), _) => warn!("Scheduled rate refresh: {}", error),
        (None, true) => debug!("Scheduled rate refresh skipped: rates are fresh"),
        (None, false) => info!("Scheduled rate refresh completed"),
    }
}
