//! Payloads of the key-protected administration surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

/// Payload to create a quiz.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQuizRequest {
    /// Display title.
    #[validate(length(min = 3, max = 128))]
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub description: String,
}

/// Partial update of quiz metadata.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQuizRequest {
    /// New title, if changing.
    #[validate(length(min = 3, max = 128))]
    pub title: Option<String>,
    /// New description, if changing.
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

/// Payload to append a question to a quiz.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    /// Question text.
    pub text: String,
    /// Answer options, at least two.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: u32,
    /// Answer window in seconds, defaults to 30.
    pub time_limit_secs: Option<u32>,
}

impl Validate for CreateQuestionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() || self.text.len() > 512 {
            errors.add(
                "text",
                ValidationError::new("text_length")
                    .with_message("question text must be between 1 and 512 characters".into()),
            );
        }
        if self.options.len() < 2 || self.options.len() > 8 {
            errors.add(
                "options",
                ValidationError::new("option_count")
                    .with_message("a question needs between 2 and 8 options".into()),
            );
        }
        if self.options.iter().any(|option| option.trim().is_empty()) {
            errors.add(
                "options",
                ValidationError::new("blank_option")
                    .with_message("answer options must not be blank".into()),
            );
        }
        if self.correct_index as usize >= self.options.len() {
            errors.add(
                "correct_index",
                ValidationError::new("correct_index_out_of_range")
                    .with_message("correct_index must point at one of the options".into()),
            );
        }
        if self.time_limit_secs == Some(0) {
            errors.add(
                "time_limit_secs",
                ValidationError::new("zero_time_limit")
                    .with_message("time limit must be at least one second".into()),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload to check an administration key.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Candidate shared secret.
    pub key: String,
}

/// Outcome of a key check.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Whether the key grants controller access.
    pub valid: bool,
}

/// Generic acknowledgement for administration actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl ActionResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: "Capital of France?".to_owned(),
            options: vec!["Paris".to_owned(), "Lyon".to_owned()],
            correct_index: 0,
            time_limit_secs: Some(20),
        }
    }

    #[test]
    fn valid_question_passes() {
        assert!(question().validate().is_ok());
    }

    #[test]
    fn correct_index_must_point_at_an_option() {
        let mut payload = question();
        payload.correct_index = 2;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn blank_options_are_rejected() {
        let mut payload = question();
        payload.options[1] = "  ".to_owned();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn a_single_option_is_rejected() {
        let mut payload = question();
        payload.options.truncate(1);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let mut payload = question();
        payload.time_limit_secs = Some(0);
        assert!(payload.validate().is_err());
    }
}
