//! Quiz and question catalogue operations.

use std::time::SystemTime;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{LeaderboardRowEntity, ParticipantEntity, QuestionEntity, QuizEntity},
    error::ServiceError,
    state::AppState,
};

const JOIN_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const JOIN_CODE_LEN: usize = 6;
const JOIN_CODE_ATTEMPTS: usize = 16;

const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_CHARSET[rng.random_range(0..JOIN_CODE_CHARSET.len())] as char)
        .collect()
}

/// All quizzes, newest first.
pub async fn list_quizzes(state: &AppState) -> Result<Vec<QuizEntity>, ServiceError> {
    let store = state.require_quiz_store().await?;
    Ok(store.list_quizzes().await?)
}

/// Create a quiz with a freshly allocated unique join code.
pub async fn create_quiz(
    state: &AppState,
    title: String,
    description: String,
) -> Result<QuizEntity, ServiceError> {
    let store = state.require_quiz_store().await?;

    let mut join_code = None;
    for _ in 0..JOIN_CODE_ATTEMPTS {
        let candidate = generate_join_code();
        if !store.join_code_exists(candidate.clone()).await? {
            join_code = Some(candidate);
            break;
        }
    }
    let join_code = join_code.ok_or_else(|| {
        ServiceError::InvalidState("could not allocate a unique join code".into())
    })?;

    let quiz = QuizEntity {
        id: Uuid::new_v4(),
        title,
        description,
        join_code,
        is_live: false,
        current_question_index: 0,
        created_at: SystemTime::now(),
        started_at: None,
    };
    store.save_quiz(quiz.clone()).await?;

    info!(quiz_id = %quiz.id, join_code = %quiz.join_code, "quiz created");
    Ok(quiz)
}

/// Update quiz metadata.
pub async fn update_quiz(
    state: &AppState,
    quiz_id: Uuid,
    title: Option<String>,
    description: Option<String>,
) -> Result<QuizEntity, ServiceError> {
    let store = state.require_quiz_store().await?;
    let mut quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;

    if let Some(title) = title {
        quiz.title = title;
    }
    if let Some(description) = description {
        quiz.description = description;
    }
    store.save_quiz(quiz.clone()).await?;
    Ok(quiz)
}

/// Delete a quiz and everything attached to it.
pub async fn delete_quiz(state: &AppState, quiz_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;

    if !store.delete_quiz(quiz_id).await? {
        return Err(ServiceError::NotFound("quiz".into()));
    }

    state.sessions().clear(quiz_id);
    let questions = store.delete_questions(quiz_id).await?;
    let participants = store.delete_participants(quiz_id).await?;

    info!(%quiz_id, questions, participants, "quiz deleted");
    Ok(())
}

/// Append a question to a quiz.
pub async fn add_question(
    state: &AppState,
    quiz_id: Uuid,
    text: String,
    options: Vec<String>,
    correct_index: u32,
    time_limit_secs: Option<u32>,
) -> Result<QuestionEntity, ServiceError> {
    let store = state.require_quiz_store().await?;
    store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;

    let question = QuestionEntity {
        id: Uuid::new_v4(),
        quiz_id,
        text,
        options,
        correct_index,
        time_limit_secs: time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS),
        created_at: SystemTime::now(),
    };
    store.save_question(question.clone()).await?;
    Ok(question)
}

/// Questions of a quiz in play order.
pub async fn list_questions(
    state: &AppState,
    quiz_id: Uuid,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    let store = state.require_quiz_store().await?;
    store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;
    Ok(store.list_questions(quiz_id).await?)
}

/// Remove a single question.
pub async fn delete_question(state: &AppState, question_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    if !store.delete_question(question_id).await? {
        return Err(ServiceError::NotFound("question".into()));
    }
    Ok(())
}

/// Join a quiz by code. Joining again under the same name returns the
/// existing participant, so reconnects keep their score.
pub async fn join_quiz(
    state: &AppState,
    join_code: String,
    name: String,
) -> Result<(QuizEntity, ParticipantEntity), ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = store
        .find_quiz_by_code(join_code)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;

    let participant = store
        .join_participant(quiz.id, name.trim().to_owned())
        .await?;
    Ok((quiz, participant))
}

/// Current top scores of a quiz.
pub async fn leaderboard(
    state: &AppState,
    quiz_id: Uuid,
) -> Result<Vec<LeaderboardRowEntity>, ServiceError> {
    let store = state.require_quiz_store().await?;
    store
        .find_quiz(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("quiz".into()))?;
    Ok(store
        .top_participants(quiz_id, state.config().leaderboard_size)
        .await?)
}
