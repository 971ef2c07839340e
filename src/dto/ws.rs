//! Websocket message vocabulary.
//!
//! Every frame is a JSON object tagged by `type`. Client frames carry the
//! acting identity inline; controller frames carry the shared key, which is
//! checked on every command rather than once at connect time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quiz::LeaderboardRow;

/// Frames a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attach this connection to a quiz as a participant.
    JoinQuiz {
        quiz_id: Uuid,
        participant_id: Uuid,
    },
    /// Attach this connection as a controller.
    JoinAdmin { quiz_id: Uuid },
    /// Attach this connection as a presentation screen.
    JoinPresentation { quiz_id: Uuid },
    /// Open a live session on a quiz.
    AdminStartQuiz { quiz_id: Uuid, key: String },
    /// Push the next question, or a specific one when `index` is set.
    AdminNextQuestion {
        quiz_id: Uuid,
        key: String,
        index: Option<u32>,
    },
    /// Show or hide the leaderboard on presentation screens.
    AdminToggleLeaderboard {
        quiz_id: Uuid,
        key: String,
        on: bool,
    },
    /// Wipe all participants and scores of a quiz.
    AdminResetParticipants { quiz_id: Uuid, key: String },
    /// Answer the currently open question.
    SubmitAnswer {
        quiz_id: Uuid,
        participant_id: Uuid,
        question_id: Uuid,
        selected_option: u32,
    },
}

/// Frames the server pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges a room join.
    Joined { ok: bool },
    /// A live session opened.
    QuizStart { quiz_id: Uuid },
    /// A question is now open for answers. The correct index is omitted.
    NewQuestion {
        id: Uuid,
        question_text: String,
        options: Vec<String>,
        time_limit: u32,
    },
    /// The answer window of a question elapsed.
    AnswerWindowClose { question_id: Uuid },
    /// Private scoring result for one submitted answer.
    AnswerResult {
        correct: bool,
        score_delta: u32,
        total_score: u32,
    },
    /// Refreshed top scores.
    UpdateLeaderboard { top: Vec<LeaderboardRow> },
    /// Leaderboard visibility changed on presentation screens.
    LeaderboardVisibility { on: bool },
    /// The live session closed.
    QuizEnd { quiz_id: Uuid },
    /// Participants were wiped.
    ParticipantsReset { count: u64 },
    /// A client frame could not be honored.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_decode_by_tag() {
        let frame: ClientMessage = serde_json::from_value(serde_json::json!({
            "type": "submit_answer",
            "quiz_id": Uuid::nil(),
            "participant_id": Uuid::nil(),
            "question_id": Uuid::nil(),
            "selected_option": 2,
        }))
        .unwrap();
        assert!(matches!(
            frame,
            ClientMessage::SubmitAnswer {
                selected_option: 2,
                ..
            }
        ));
    }

    #[test]
    fn question_event_never_carries_the_answer() {
        let event = ServerEvent::NewQuestion {
            id: Uuid::nil(),
            question_text: "Capital of France?".to_owned(),
            options: vec!["Paris".to_owned(), "Lyon".to_owned()],
            time_limit: 30,
        };
        let encoded = serde_json::to_string(&event).unwrap();
        assert!(!encoded.contains("correct"));
        assert!(encoded.contains("\"type\":\"new_question\""));
    }
}
