//! Websocket connection handling and frame dispatch.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::{answer_service, broadcast, lifecycle_service};
use crate::{
    dto::ws::{ClientMessage, ServerEvent},
    error::ServiceError,
    state::{Audience, SharedState},
};

/// Drive one websocket connection until it closes.
///
/// Outbound frames flow through an unbounded channel into a dedicated
/// writer task, so fanout paths never block on a slow socket.
pub async fn handle_socket(socket: WebSocket, state: SharedState) {
    let connection_id = Uuid::new_v4();
    debug!(%connection_id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.rooms().register(connection_id, tx);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            Message::Text(raw) => match serde_json::from_str::<ClientMessage>(&raw) {
                Ok(message) => handle_client_message(&state, connection_id, message).await,
                Err(err) => {
                    warn!(%connection_id, error = %err, "unreadable client frame");
                    broadcast::send_to_connection(
                        &state,
                        connection_id,
                        &ServerEvent::Error {
                            message: "unreadable frame".into(),
                        },
                    );
                }
            },
            Message::Close(_) => break,
            // Pings are answered by the protocol layer.
            other => trace!(%connection_id, ?other, "ignoring non-text frame"),
        }
    }

    if let Some((quiz_id, audience)) = state.rooms().unregister(connection_id) {
        debug!(%connection_id, %quiz_id, ?audience, "websocket left room");
    }
    writer.abort();
    debug!(%connection_id, "websocket disconnected");
}

/// Dispatch one decoded client frame. Failures turn into an error event on
/// the acting connection; they never tear the socket down.
pub async fn handle_client_message(
    state: &SharedState,
    connection_id: Uuid,
    message: ClientMessage,
) {
    let result = match message {
        ClientMessage::JoinQuiz {
            quiz_id,
            participant_id,
        } => join_quiz(state, connection_id, quiz_id, participant_id).await,
        ClientMessage::JoinAdmin { quiz_id } => join_admin(state, connection_id, quiz_id).await,
        ClientMessage::JoinPresentation { quiz_id } => {
            join_presentation(state, connection_id, quiz_id).await
        }
        ClientMessage::AdminStartQuiz { quiz_id, key } => {
            lifecycle_service::start_quiz(state, quiz_id, &key).await
        }
        ClientMessage::AdminNextQuestion {
            quiz_id,
            key,
            index,
        } => lifecycle_service::advance_question(state, quiz_id, &key, index).await,
        ClientMessage::AdminToggleLeaderboard { quiz_id, key, on } => {
            lifecycle_service::toggle_leaderboard(state, quiz_id, &key, on).await
        }
        ClientMessage::AdminResetParticipants { quiz_id, key } => {
            lifecycle_service::reset_participants(state, quiz_id, &key).await
        }
        ClientMessage::SubmitAnswer {
            quiz_id,
            participant_id,
            question_id,
            selected_option,
        } => {
            answer_service::submit_answer(
                state,
                connection_id,
                quiz_id,
                participant_id,
                question_id,
                selected_option,
            )
            .await
        }
    };

    if let Err(err) = result {
        debug!(%connection_id, error = %err, "client frame rejected");
        broadcast::send_to_connection(
            state,
            connection_id,
            &ServerEvent::Error {
                message: err.to_string(),
            },
        );
    }
}

async fn join_quiz(
    state: &SharedState,
    connection_id: Uuid,
    quiz_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("participant".into()))?;
    if participant.quiz_id != quiz_id {
        return Err(ServiceError::InvalidInput(
            "participant does not belong to this quiz".into(),
        ));
    }

    state
        .rooms()
        .join(connection_id, quiz_id, Audience::Participant);
    store
        .set_participant_connection(participant_id, Some(connection_id))
        .await?;

    broadcast::send_to_connection(state, connection_id, &ServerEvent::Joined { ok: true });
    resync_active_question(state, connection_id, quiz_id).await
}

async fn join_admin(
    state: &SharedState,
    connection_id: Uuid,
    quiz_id: Uuid,
) -> Result<(), ServiceError> {
    state
        .rooms()
        .join(connection_id, quiz_id, Audience::Controller);
    broadcast::send_to_connection(state, connection_id, &ServerEvent::Joined { ok: true });
    resync_active_question(state, connection_id, quiz_id).await
}

async fn join_presentation(
    state: &SharedState,
    connection_id: Uuid,
    quiz_id: Uuid,
) -> Result<(), ServiceError> {
    state
        .rooms()
        .join(connection_id, quiz_id, Audience::Presentation);
    broadcast::send_to_connection(state, connection_id, &ServerEvent::Joined { ok: true });

    // Snapshot so a screen attached mid-session shows the right phase.
    // Screens never receive question payloads, only lifecycle signals.
    match state.sessions().get(quiz_id) {
        Some(session) => {
            broadcast::send_to_connection(
                state,
                connection_id,
                &ServerEvent::QuizStart { quiz_id },
            );
            if session.leaderboard_visible {
                broadcast::send_to_connection(
                    state,
                    connection_id,
                    &ServerEvent::LeaderboardVisibility { on: true },
                );
            }
        }
        None => {
            broadcast::send_to_connection(state, connection_id, &ServerEvent::QuizEnd { quiz_id });
        }
    }
    Ok(())
}

/// Resend the currently open question, if any, to one connection.
async fn resync_active_question(
    state: &SharedState,
    connection_id: Uuid,
    quiz_id: Uuid,
) -> Result<(), ServiceError> {
    let Some(session) = state.sessions().get(quiz_id) else {
        return Ok(());
    };
    let Some(question_id) = session.active_question else {
        return Ok(());
    };

    let store = state.require_quiz_store().await?;
    if let Some(question) = store.find_question(question_id).await? {
        broadcast::send_to_connection(
            state,
            connection_id,
            &ServerEvent::NewQuestion {
                id: question.id,
                question_text: question.text,
                options: question.options,
                time_limit: question.time_limit_secs,
            },
        );
    }
    Ok(())
}
