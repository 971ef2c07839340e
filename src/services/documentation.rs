//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::{
    dto::{
        admin::{
            ActionResponse, CreateQuestionRequest, CreateQuizRequest, UpdateQuizRequest,
            VerifyRequest, VerifyResponse,
        },
        health::HealthResponse,
        quiz::{JoinQuizRequest, JoinQuizResponse, LeaderboardRow, QuestionSummary, QuizSummary},
    },
    routes,
};

/// OpenAPI description of the HTTP surface. The websocket vocabulary lives
/// in [`crate::dto::ws`] and is not part of this document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "live-quiz-back",
        description = "Coordination backend for live multi-participant quiz sessions"
    ),
    paths(
        routes::health::healthcheck,
        routes::quiz::list_quizzes,
        routes::quiz::list_questions,
        routes::quiz::leaderboard,
        routes::quiz::join_quiz,
        routes::admin::verify_key,
        routes::admin::create_quiz,
        routes::admin::update_quiz,
        routes::admin::delete_quiz,
        routes::admin::create_question,
        routes::admin::delete_question,
    ),
    components(schemas(
        HealthResponse,
        QuizSummary,
        QuestionSummary,
        JoinQuizRequest,
        JoinQuizResponse,
        LeaderboardRow,
        CreateQuizRequest,
        UpdateQuizRequest,
        CreateQuestionRequest,
        VerifyRequest,
        VerifyResponse,
        ActionResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "quiz", description = "Public quiz access"),
        (name = "admin", description = "Key-protected administration")
    )
)]
pub struct ApiDoc;
