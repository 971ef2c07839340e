//! Event fanout to session rooms.

use axum::extract::ws::Message;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ServerEvent,
    error::ServiceError,
    state::{AppState, Audience},
};

/// Serialize an event once and push it to the given audiences of a quiz.
pub fn send_event(state: &AppState, quiz_id: Uuid, audiences: &[Audience], event: &ServerEvent) {
    let Some(frame) = encode(event) else {
        return;
    };
    for audience in audiences {
        state.rooms().send_to_room(quiz_id, *audience, frame.clone());
    }
}

/// Push an event to one connection.
pub fn send_to_connection(state: &AppState, connection_id: Uuid, event: &ServerEvent) {
    if let Some(frame) = encode(event) {
        state.rooms().send_to(connection_id, frame);
    }
}

/// Recompute the top scores of a quiz and push them to every audience.
pub async fn broadcast_leaderboard(state: &AppState, quiz_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    let top = store
        .top_participants(quiz_id, state.config().leaderboard_size)
        .await?;

    debug!(%quiz_id, rows = top.len(), "pushing leaderboard");
    send_event(
        state,
        quiz_id,
        &Audience::ALL,
        &ServerEvent::UpdateLeaderboard {
            top: top.into_iter().map(Into::into).collect(),
        },
    );
    Ok(())
}

fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(encoded) => Some(Message::Text(encoded.into())),
        Err(err) => {
            warn!(error = %err, "failed to serialize server event");
            None
        }
    }
}
