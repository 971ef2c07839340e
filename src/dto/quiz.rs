//! Public-facing quiz payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{format_system_time, validation::validate_join_code};
use crate::dao::models::{LeaderboardRowEntity, QuestionEntity, QuizEntity};

/// Quiz metadata as listed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizSummary {
    /// Quiz identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Code participants use to join.
    pub join_code: String,
    /// Whether a live session is running.
    pub is_live: bool,
    /// Index of the question currently pushed, when live.
    pub current_question_index: u32,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Session start timestamp, RFC 3339, when live.
    pub started_at: Option<String>,
}

impl From<QuizEntity> for QuizSummary {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            join_code: value.join_code,
            is_live: value.is_live,
            current_question_index: value.current_question_index,
            created_at: format_system_time(value.created_at),
            started_at: value.started_at.map(format_system_time),
        }
    }
}

/// A question as shown to participants. The correct answer never leaves
/// the server through this type.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub text: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Answer window length in seconds.
    pub time_limit_secs: u32,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            time_limit_secs: value.time_limit_secs,
        }
    }
}

/// Payload to join a quiz by its code.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinQuizRequest {
    /// Six-character join code, case-insensitive.
    #[serde(deserialize_with = "uppercased")]
    pub join_code: String,
    /// Display name of the participant.
    pub name: String,
}

impl Validate for JoinQuizRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_join_code(&self.join_code) {
            errors.add("join_code", e);
        }

        let name = self.name.trim();
        if name.is_empty() || name.len() > 64 {
            errors.add(
                "name",
                ValidationError::new("name_length")
                    .with_message("name must be between 1 and 64 characters".into()),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn uppercased<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_ascii_uppercase())
}

/// Result of joining a quiz.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinQuizResponse {
    /// Quiz joined.
    pub quiz_id: Uuid,
    /// Stable participant identity, reused on reconnect.
    pub participant_id: Uuid,
    /// Display name, as stored.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
}

/// A single leaderboard line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LeaderboardRow {
    /// Participant display name.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
}

impl From<LeaderboardRowEntity> for LeaderboardRow {
    fn from(value: LeaderboardRowEntity) -> Self {
        Self {
            name: value.name,
            score: value.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_request_uppercases_code() {
        let request: JoinQuizRequest =
            serde_json::from_value(serde_json::json!({"join_code": " ab12cd ", "name": "Ada"}))
                .unwrap();
        assert_eq!(request.join_code, "AB12CD");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn join_request_rejects_blank_name() {
        let request: JoinQuizRequest =
            serde_json::from_value(serde_json::json!({"join_code": "AB12CD", "name": ""}))
                .unwrap();
        assert!(request.validate().is_err());
    }
}
