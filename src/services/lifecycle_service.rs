//! Controller-driven session lifecycle.
//!
//! Every command revalidates the shared key; a command with a bad key is
//! dropped without feedback so the socket leaks nothing about the secret.
//! Durable writes land before the in-memory session registry moves, so a
//! crash between the two replays cleanly from storage.

use std::time::{Duration, SystemTime};

use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use super::broadcast;
use crate::{
    dto::ws::ServerEvent,
    error::ServiceError,
    state::{Audience, SessionState, SharedState},
};

/// Open a live session on a quiz. No question is pushed until the
/// controller advances explicitly.
pub async fn start_quiz(state: &SharedState, quiz_id: Uuid, key: &str) -> Result<(), ServiceError> {
    if !state.authorizes(key) {
        debug!(%quiz_id, "dropping start command with bad key");
        return Ok(());
    }

    let store = state.require_quiz_store().await?;
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;

    if state.sessions().contains(quiz_id) {
        return Err(ServiceError::InvalidState("session is already live".into()));
    }

    store.mark_quiz_live(quiz_id, SystemTime::now()).await?;
    state.sessions().set(quiz_id, SessionState::waiting());

    info!(%quiz_id, title = %quiz.title, "session started");
    broadcast::send_event(
        state,
        quiz_id,
        &Audience::ALL,
        &ServerEvent::QuizStart { quiz_id },
    );
    Ok(())
}

/// Push the next question of a live session, or the one at `index` when
/// given. Advancing to a question that does not exist ends the session.
pub async fn advance_question(
    state: &SharedState,
    quiz_id: Uuid,
    key: &str,
    index: Option<u32>,
) -> Result<(), ServiceError> {
    if !state.authorizes(key) {
        debug!(%quiz_id, "dropping advance command with bad key");
        return Ok(());
    }

    let store = state.require_quiz_store().await?;
    let session = state
        .sessions()
        .get(quiz_id)
        .ok_or_else(|| ServiceError::InvalidState("quiz is not live".into()))?;

    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;

    let questions = store.list_questions(quiz_id).await?;
    let next = index.unwrap_or(quiz.current_question_index);

    let Some(question) = questions.get(next as usize).cloned() else {
        // No question at the target index: the session is over.
        return end_session(state, quiz_id).await;
    };

    store.set_question_index(quiz_id, next + 1).await?;

    let window = Duration::from_secs(u64::from(question.time_limit_secs));
    state.sessions().set(
        quiz_id,
        SessionState::for_question(question.id, window, session.leaderboard_visible),
    );

    info!(%quiz_id, question = %question.id, index = next, "question pushed");
    broadcast::send_event(
        state,
        quiz_id,
        &[Audience::Participant, Audience::Controller],
        &ServerEvent::NewQuestion {
            id: question.id,
            question_text: question.text,
            options: question.options,
            time_limit: question.time_limit_secs,
        },
    );

    schedule_window_close(state, quiz_id, question.id, window);
    Ok(())
}

/// Close the answer window after it elapses. The timer is aborted when the
/// session moves on first, and checks the active question again at fire
/// time in case it lost that race.
fn schedule_window_close(state: &SharedState, quiz_id: Uuid, question_id: Uuid, window: Duration) {
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        sleep(window).await;

        let mut closed = false;
        task_state.sessions().update(quiz_id, |session| {
            if session.active_question == Some(question_id) {
                session.active_question = None;
                closed = true;
            }
        });

        if closed {
            debug!(%quiz_id, %question_id, "answer window closed");
            broadcast::send_event(
                &task_state,
                quiz_id,
                &Audience::ALL,
                &ServerEvent::AnswerWindowClose { question_id },
            );
        }
    });
    state.sessions().set_window_task(quiz_id, task.abort_handle());
}

/// Show or hide the leaderboard. Showing it also pushes fresh scores.
pub async fn toggle_leaderboard(
    state: &SharedState,
    quiz_id: Uuid,
    key: &str,
    on: bool,
) -> Result<(), ServiceError> {
    if !state.authorizes(key) {
        debug!(%quiz_id, "dropping leaderboard toggle with bad key");
        return Ok(());
    }

    let live = state
        .sessions()
        .update(quiz_id, |session| session.leaderboard_visible = on);
    if !live {
        return Err(ServiceError::InvalidState("quiz is not live".into()));
    }

    broadcast::send_event(
        state,
        quiz_id,
        &[Audience::Participant, Audience::Presentation],
        &ServerEvent::LeaderboardVisibility { on },
    );
    if on {
        broadcast::broadcast_leaderboard(state, quiz_id).await?;
    }
    Ok(())
}

/// Wipe every participant of a quiz, scores included.
pub async fn reset_participants(
    state: &SharedState,
    quiz_id: Uuid,
    key: &str,
) -> Result<(), ServiceError> {
    if !state.authorizes(key) {
        debug!(%quiz_id, "dropping reset command with bad key");
        return Ok(());
    }

    let store = state.require_quiz_store().await?;
    let count = store.delete_participants(quiz_id).await?;

    info!(%quiz_id, count, "participants reset");
    broadcast::send_event(
        state,
        quiz_id,
        &Audience::ALL,
        &ServerEvent::ParticipantsReset { count },
    );
    broadcast::broadcast_leaderboard(state, quiz_id).await
}

/// Close a live session, pushing the final leaderboard to everyone.
pub async fn end_session(state: &SharedState, quiz_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    store.mark_quiz_ended(quiz_id).await?;

    // Removing the entry also aborts any pending window timer.
    state.sessions().clear(quiz_id);

    info!(%quiz_id, "session ended");
    broadcast::send_event(
        state,
        quiz_id,
        &Audience::ALL,
        &ServerEvent::QuizEnd { quiz_id },
    );
    broadcast::broadcast_leaderboard(state, quiz_id).await
}
