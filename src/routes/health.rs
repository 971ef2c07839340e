//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

/// Health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/healthcheck", get(healthcheck))
}

/// Report service health.
#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses(
        (status = 200, description = "Service health snapshot", body = HealthResponse)
    )
)]
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::current_health(&state))
}
