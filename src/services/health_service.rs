//! Service health snapshot.

use crate::{dto::health::HealthResponse, state::AppState};

/// Current health, reflecting whether the durable store is reachable.
pub fn current_health(state: &AppState) -> HealthResponse {
    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
