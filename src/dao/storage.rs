//! Storage abstraction consumed by the session coordinator and REST layer.

use std::error::Error;
use std::time::SystemTime;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{
    AnswerRecordEntity, LeaderboardRowEntity, ParticipantEntity, QuestionEntity, QuizEntity,
};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Abstraction over the persistence layer for quizzes, questions, and
/// participants.
///
/// The coordinator treats this as a slower, independently failing
/// collaborator: every method can return [`StorageError`], and callers must
/// not advance in-memory session state when a required write failed.
pub trait QuizStore: Send + Sync {
    /// Insert or replace a quiz record.
    fn save_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a quiz by id.
    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Fetch a quiz by its join code.
    fn find_quiz_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// List all quizzes, newest first.
    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;
    /// Delete a quiz record. Returns whether it existed.
    fn delete_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Whether any quiz already uses the given join code.
    fn join_code_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Mark a quiz live: sets the flag, resets the question index to zero,
    /// and stamps the start time.
    fn mark_quiz_live(
        &self,
        id: Uuid,
        started_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Mark a quiz not-live and reset its question index.
    fn mark_quiz_ended(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Persist the quiz's current question index.
    fn set_question_index(&self, id: Uuid, index: u32) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert or replace a question record.
    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a question by id.
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// List the questions of a quiz ordered by creation.
    fn list_questions(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Delete a question. Returns whether it existed.
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete every question of a quiz, returning the removed count.
    fn delete_questions(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Fetch the participant named `name` in the quiz, creating the record
    /// on first join (idempotent upsert keyed by `(quiz_id, name)`).
    fn join_participant(
        &self,
        quiz_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>>;
    /// Fetch a participant by id.
    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Stamp the participant's current connection (last-writer-wins).
    fn set_participant_connection(
        &self,
        id: Uuid,
        connection: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically apply a scored answer: increment the score by `delta` and
    /// append `record`, but only when no answer for that question exists yet.
    ///
    /// Returns the updated participant, or `None` when the participant is
    /// unknown or has already answered this question (duplicate rejected,
    /// nothing re-scored). Must be a single atomic update, not
    /// read-modify-write.
    fn record_answer(
        &self,
        participant_id: Uuid,
        record: AnswerRecordEntity,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Top `limit` participants of a quiz: score descending, ties broken by
    /// the earliest score update.
    fn top_participants(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>>;
    /// Number of participants registered for a quiz.
    fn count_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;
    /// Delete every participant of a quiz, returning the removed count.
    fn delete_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a broken backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
