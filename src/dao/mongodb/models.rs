//! Wire representations of the quiz entities as stored in MongoDB.
//!
//! Identifiers are stored as their canonical string form so documents stay
//! readable in the shell; timestamps use native BSON datetimes so the
//! leaderboard sort works server-side.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    AnswerRecordEntity, ParticipantEntity, QuestionEntity, QuizEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuizDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    join_code: String,
    is_live: bool,
    current_question_index: u32,
    created_at: DateTime,
    started_at: Option<DateTime>,
}

impl From<QuizEntity> for MongoQuizDocument {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title,
            description: value.description,
            join_code: value.join_code,
            is_live: value.is_live,
            current_question_index: value.current_question_index,
            created_at: DateTime::from_system_time(value.created_at),
            started_at: value.started_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoQuizDocument> for QuizEntity {
    fn from(value: MongoQuizDocument) -> Self {
        Self {
            id: parse_uuid(&value.id),
            title: value.title,
            description: value.description,
            join_code: value.join_code,
            is_live: value.is_live,
            current_question_index: value.current_question_index,
            created_at: value.created_at.to_system_time(),
            started_at: value.started_at.map(|at| at.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    quiz_id: String,
    text: String,
    options: Vec<String>,
    correct_index: u32,
    time_limit_secs: u32,
    created_at: DateTime,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            quiz_id: value.quiz_id.to_string(),
            text: value.text,
            options: value.options,
            correct_index: value.correct_index,
            time_limit_secs: value.time_limit_secs,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: parse_uuid(&value.id),
            quiz_id: parse_uuid(&value.quiz_id),
            text: value.text,
            options: value.options,
            correct_index: value.correct_index,
            time_limit_secs: value.time_limit_secs,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerRecord {
    pub question_id: String,
    pub selected_option: u32,
    pub correct: bool,
    pub answer_time_ms: u64,
}

impl From<AnswerRecordEntity> for MongoAnswerRecord {
    fn from(value: AnswerRecordEntity) -> Self {
        Self {
            question_id: value.question_id.to_string(),
            selected_option: value.selected_option,
            correct: value.correct,
            answer_time_ms: value.answer_time_ms,
        }
    }
}

impl From<MongoAnswerRecord> for AnswerRecordEntity {
    fn from(value: MongoAnswerRecord) -> Self {
        Self {
            question_id: parse_uuid(&value.question_id),
            selected_option: value.selected_option,
            correct: value.correct,
            answer_time_ms: value.answer_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: String,
    quiz_id: String,
    name: String,
    score: u32,
    #[serde(default)]
    answers: Vec<MongoAnswerRecord>,
    connection_id: Option<String>,
    joined_at: DateTime,
    score_updated_at: DateTime,
}

impl MongoParticipantDocument {
    /// Document inserted when a participant joins for the first time.
    pub fn on_insert(id: Uuid, quiz_id: Uuid, joined_at: DateTime) -> Document {
        doc! {
            "_id": id.to_string(),
            "quiz_id": quiz_id.to_string(),
            "score": 0_i64,
            "answers": [],
            "connection_id": mongodb::bson::Bson::Null,
            "joined_at": joined_at,
            "score_updated_at": joined_at,
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            id: parse_uuid(&value.id),
            quiz_id: parse_uuid(&value.quiz_id),
            name: value.name,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            connection_id: value.connection_id.as_deref().map(parse_uuid),
            joined_at: value.joined_at.to_system_time(),
            score_updated_at: value.score_updated_at.to_system_time(),
        }
    }
}

/// Filter matching a document by its string `_id`.
pub fn doc_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

fn parse_uuid(raw: &str) -> Uuid {
    // Ids are written by this backend only; a corrupt id maps to the nil
    // uuid rather than failing the whole query.
    Uuid::parse_str(raw).unwrap_or(Uuid::nil())
}
