//! Entities shared between the storage backends and the service layer.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Durable quiz record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional free-form description.
    pub description: String,
    /// Six-character join code (uppercase alphanumeric, globally unique).
    pub join_code: String,
    /// Whether a live session is currently running for this quiz.
    pub is_live: bool,
    /// Index of the next question to serve.
    pub current_question_index: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// When the quiz was last started, if ever.
    pub started_at: Option<SystemTime>,
}

/// Durable question record. Immutable once it is being served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Owning quiz.
    pub quiz_id: Uuid,
    /// Question text shown to participants.
    pub text: String,
    /// Answer options (at least two).
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: u32,
    /// Answer window length in seconds.
    pub time_limit_secs: u32,
    /// Creation timestamp, also the serving order key.
    pub created_at: SystemTime,
}

/// One scored submission inside a participant record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRecordEntity {
    /// Question this answer was given for.
    pub question_id: Uuid,
    /// Option index the participant selected.
    pub selected_option: u32,
    /// Whether the selection matched the correct index.
    pub correct: bool,
    /// Elapsed time between question start and submission.
    pub answer_time_ms: u64,
}

/// Durable participant record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Primary key of the participant.
    pub id: Uuid,
    /// Owning quiz.
    pub quiz_id: Uuid,
    /// Display name, unique within the quiz.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
    /// Append-only history of scored answers.
    pub answers: Vec<AnswerRecordEntity>,
    /// Identifier of the last connection that joined as this participant.
    pub connection_id: Option<Uuid>,
    /// When the participant first joined.
    pub joined_at: SystemTime,
    /// When the score last changed; leaderboard tie-break key.
    pub score_updated_at: SystemTime,
}

/// Leaderboard projection of a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardRowEntity {
    /// Participant display name.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
}
