//! Key-protected administration endpoints.
//!
//! Every route except `/admin/verify` sits behind a middleware checking the
//! `x-admin-key` header against the configured authorizer.

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, CreateQuestionRequest, CreateQuizRequest, UpdateQuizRequest,
            VerifyRequest, VerifyResponse,
        },
        quiz::{QuestionSummary, QuizSummary},
    },
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

/// Header carrying the shared controller credential.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Administration routes subtree.
pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/admin/quizzes", post(create_quiz))
        .route(
            "/admin/quizzes/{quiz_id}",
            put(update_quiz).delete(delete_quiz),
        )
        .route("/admin/quizzes/{quiz_id}/questions", post(create_question))
        .route("/admin/questions/{question_id}", delete(delete_question))
        .layer(middleware::from_fn_with_state(state, require_admin_key));

    Router::new()
        .route("/admin/verify", post(verify_key))
        .merge(protected)
}

async fn require_admin_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if state.authorizes(key) {
        Ok(next.run(request).await)
    } else {
        Err(AppError::Unauthorized("invalid administration key".into()))
    }
}

/// Check a candidate administration key.
#[utoipa::path(
    post,
    path = "/admin/verify",
    tag = "admin",
    request_body = VerifyRequest,
    responses((status = 200, description = "Whether the key is valid", body = VerifyResponse))
)]
pub async fn verify_key(
    State(state): State<SharedState>,
    Json(payload): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: state.authorizes(&payload.key),
    })
}

/// Create a quiz.
#[utoipa::path(
    post,
    path = "/admin/quizzes",
    tag = "admin",
    request_body = CreateQuizRequest,
    responses(
        (status = 200, description = "Created quiz", body = QuizSummary),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid key")
    )
)]
pub async fn create_quiz(
    State(state): State<SharedState>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<Json<QuizSummary>, AppError> {
    payload.validate()?;
    let quiz = quiz_service::create_quiz(&state, payload.title, payload.description).await?;
    Ok(Json(quiz.into()))
}

/// Update quiz metadata.
#[utoipa::path(
    put,
    path = "/admin/quizzes/{quiz_id}",
    tag = "admin",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    request_body = UpdateQuizRequest,
    responses(
        (status = 200, description = "Updated quiz", body = QuizSummary),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn update_quiz(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<Json<QuizSummary>, AppError> {
    payload.validate()?;
    let quiz =
        quiz_service::update_quiz(&state, quiz_id, payload.title, payload.description).await?;
    Ok(Json(quiz.into()))
}

/// Delete a quiz with its questions and participants.
#[utoipa::path(
    delete,
    path = "/admin/quizzes/{quiz_id}",
    tag = "admin",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Quiz deleted", body = ActionResponse),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn delete_quiz(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    quiz_service::delete_quiz(&state, quiz_id).await?;
    Ok(Json(ActionResponse::new("quiz deleted")))
}

/// Append a question to a quiz.
#[utoipa::path(
    post,
    path = "/admin/quizzes/{quiz_id}/questions",
    tag = "admin",
    params(("quiz_id" = Uuid, Path, description = "Quiz identifier")),
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Created question", body = QuestionSummary),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<Json<QuestionSummary>, AppError> {
    payload.validate()?;
    let question = quiz_service::add_question(
        &state,
        quiz_id,
        payload.text,
        payload.options,
        payload.correct_index,
        payload.time_limit_secs,
    )
    .await?;
    Ok(Json(question.into()))
}

/// Remove a question.
#[utoipa::path(
    delete,
    path = "/admin/questions/{question_id}",
    tag = "admin",
    params(("question_id" = Uuid, Path, description = "Question identifier")),
    responses(
        (status = 200, description = "Question deleted", body = ActionResponse),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    quiz_service::delete_question(&state, question_id).await?;
    Ok(Json(ActionResponse::new("question deleted")))
}
