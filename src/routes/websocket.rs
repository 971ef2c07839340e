//! Websocket upgrade endpoint.

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::any,
};

use crate::{services::websocket_service, state::SharedState};

/// Websocket routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/ws", any(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(socket, state))
}
