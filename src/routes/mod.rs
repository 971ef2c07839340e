//! HTTP surface composition.

pub mod admin;
pub mod docs;
pub mod health;
pub mod quiz;
pub mod websocket;

use axum::Router;

use crate::state::SharedState;

/// Assemble the full application router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(quiz::router())
        .merge(admin::router(state.clone()))
        .merge(websocket::router())
        .merge(docs::router())
        .with_state(state)
}
