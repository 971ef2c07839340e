//! Background supervision of the durable store.
//!
//! Periodically pings the installed store. On failure the service enters
//! degraded mode and the supervisor retries the connection with capped
//! exponential backoff until storage comes back.

use std::time::Duration;

use tokio::time::{interval, sleep};
use tracing::{info, warn};

use crate::state::SharedState;

const HEALTH_PERIOD: Duration = Duration::from_secs(10);
const RECONNECT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Run the supervision loop. Never returns; spawn it.
pub async fn run(state: SharedState) {
    let mut ticker = interval(HEALTH_PERIOD);
    loop {
        ticker.tick().await;

        let Some(store) = state.quiz_store().await else {
            continue;
        };

        match store.health_check().await {
            Ok(()) => state.update_degraded(false),
            Err(err) => {
                warn!(error = %err, "storage health check failed, entering degraded mode");
                state.update_degraded(true);

                let mut delay = RECONNECT_INITIAL_DELAY;
                loop {
                    sleep(delay).await;
                    match store.try_reconnect().await {
                        Ok(()) => {
                            info!("storage connection restored");
                            state.update_degraded(false);
                            break;
                        }
                        Err(err) => {
                            warn!(error = %err, retry_in = ?delay, "storage reconnect failed");
                            delay = (delay * 2).min(RECONNECT_MAX_DELAY);
                        }
                    }
                }
            }
        }
    }
}
