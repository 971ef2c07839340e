//! Public quiz endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::quiz::{JoinQuizRequest, JoinQuizResponse, LeaderboardRow, QuestionSummary, QuizSummary},
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

/// Public quiz routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes", get(list_quizzes))
        .route("/quizzes/{quiz_id}/questions", get(list_questions))
        .route("/quizzes/{quiz_id}/leaderboard", get(leaderboard))
        .route("/join", post(join_quiz))
}

/// List all quizzes.
#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "quiz",
    responses(
        (status = 200, description = "All quizzes, newest first", body = [QuizSummary]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_quizzes(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    let quizzes = quiz_service::list_quizzes(&state).await?;
    Ok(Json(quizzes.into_iter().map(Into::into).collect()))
}

/// List the questions of a quiz. Correct answers are not included.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/questions",
    tag = "quiz",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Questions in play order", body = [QuestionSummary]),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn list_questions(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    let questions = quiz_service::list_questions(&state, quiz_id).await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

/// Current top scores of a quiz.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/leaderboard",
    tag = "quiz",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Top scores", body = [LeaderboardRow]),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    let rows = quiz_service::leaderboard(&state, quiz_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Join a quiz by code, creating or recovering a participant identity.
#[utoipa::path(
    post,
    path = "/join",
    tag = "quiz",
    request_body = JoinQuizRequest,
    responses(
        (status = 200, description = "Participant identity", body = JoinQuizResponse),
        (status = 400, description = "Malformed join code or name"),
        (status = 404, description = "No quiz with this code")
    )
)]
pub async fn join_quiz(
    State(state): State<SharedState>,
    Json(payload): Json<JoinQuizRequest>,
) -> Result<Json<JoinQuizResponse>, AppError> {
    payload.validate()?;
    let (quiz, participant) =
        quiz_service::join_quiz(&state, payload.join_code, payload.name).await?;
    Ok(Json(JoinQuizResponse {
        quiz_id: quiz.id,
        participant_id: participant.id,
        name: participant.name,
        score: participant.score,
    }))
}
