//! In-process [`QuizStore`] backend.
//!
//! Backs the integration test suite and storage-free development runs. The
//! query semantics (question ordering, leaderboard sort and tie-break,
//! duplicate-answer guard) mirror the MongoDB backend exactly.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        AnswerRecordEntity, LeaderboardRowEntity, ParticipantEntity, QuestionEntity, QuizEntity,
    },
    storage::{QuizStore, StorageResult},
};

#[derive(Default)]
struct MemoryInner {
    quizzes: HashMap<Uuid, QuizEntity>,
    questions: HashMap<Uuid, QuestionEntity>,
    participants: HashMap<Uuid, ParticipantEntity>,
}

/// Mutex-guarded map store with the same observable behavior as the MongoDB
/// backend.
#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryQuizStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock only happens after a panic in another test thread.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl QuizStore for MemoryQuizStore {
    fn save_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().quizzes.insert(quiz.id, quiz);
            Ok(())
        })
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().quizzes.get(&id).cloned()) })
    }

    fn find_quiz_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .quizzes
                .values()
                .find(|quiz| quiz.join_code == code)
                .cloned())
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut quizzes: Vec<QuizEntity> = store.lock().quizzes.values().cloned().collect();
            quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(quizzes)
        })
    }

    fn delete_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().quizzes.remove(&id).is_some()) })
    }

    fn join_code_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .quizzes
                .values()
                .any(|quiz| quiz.join_code == code))
        })
    }

    fn mark_quiz_live(
        &self,
        id: Uuid,
        started_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(quiz) = store.lock().quizzes.get_mut(&id) {
                quiz.is_live = true;
                quiz.current_question_index = 0;
                quiz.started_at = Some(started_at);
            }
            Ok(())
        })
    }

    fn mark_quiz_ended(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(quiz) = store.lock().quizzes.get_mut(&id) {
                quiz.is_live = false;
                quiz.current_question_index = 0;
            }
            Ok(())
        })
    }

    fn set_question_index(&self, id: Uuid, index: u32) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(quiz) = store.lock().quizzes.get_mut(&id) {
                quiz.current_question_index = index;
            }
            Ok(())
        })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().questions.insert(question.id, question);
            Ok(())
        })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().questions.get(&id).cloned()) })
    }

    fn list_questions(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questions: Vec<QuestionEntity> = store
                .lock()
                .questions
                .values()
                .filter(|question| question.quiz_id == quiz_id)
                .cloned()
                .collect();
            questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(questions)
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().questions.remove(&id).is_some()) })
    }

    fn delete_questions(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            let before = guard.questions.len();
            guard.questions.retain(|_, question| question.quiz_id != quiz_id);
            Ok((before - guard.questions.len()) as u64)
        })
    }

    fn join_participant(
        &self,
        quiz_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            if let Some(existing) = guard
                .participants
                .values()
                .find(|participant| participant.quiz_id == quiz_id && participant.name == name)
            {
                return Ok(existing.clone());
            }

            let now = SystemTime::now();
            let participant = ParticipantEntity {
                id: Uuid::new_v4(),
                quiz_id,
                name,
                score: 0,
                answers: Vec::new(),
                connection_id: None,
                joined_at: now,
                score_updated_at: now,
            };
            guard.participants.insert(participant.id, participant.clone());
            Ok(participant)
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().participants.get(&id).cloned()) })
    }

    fn set_participant_connection(
        &self,
        id: Uuid,
        connection: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(participant) = store.lock().participants.get_mut(&id) {
                participant.connection_id = connection;
            }
            Ok(())
        })
    }

    fn record_answer(
        &self,
        participant_id: Uuid,
        record: AnswerRecordEntity,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            let Some(participant) = guard.participants.get_mut(&participant_id) else {
                return Ok(None);
            };
            if participant
                .answers
                .iter()
                .any(|answer| answer.question_id == record.question_id)
            {
                return Ok(None);
            }

            participant.score += delta;
            participant.answers.push(record);
            participant.score_updated_at = SystemTime::now();
            Ok(Some(participant.clone()))
        })
    }

    fn top_participants(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut ranked: Vec<ParticipantEntity> = store
                .lock()
                .participants
                .values()
                .filter(|participant| participant.quiz_id == quiz_id)
                .cloned()
                .collect();
            // Score descending; first to reach a score wins the tie.
            ranked.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then(a.score_updated_at.cmp(&b.score_updated_at))
            });
            Ok(ranked
                .into_iter()
                .take(limit)
                .map(|participant| LeaderboardRowEntity {
                    name: participant.name,
                    score: participant.score,
                })
                .collect())
        })
    }

    fn count_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .participants
                .values()
                .filter(|participant| participant.quiz_id == quiz_id)
                .count() as u64)
        })
    }

    fn delete_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.lock();
            let before = guard.participants.len();
            guard
                .participants
                .retain(|_, participant| participant.quiz_id != quiz_id);
            Ok((before - guard.participants.len()) as u64)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(created_secs: u64) -> QuizEntity {
        QuizEntity {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            join_code: "ABC123".into(),
            is_live: false,
            current_question_index: 0,
            created_at: SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(created_secs),
            started_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_answer_is_not_applied() {
        let store = MemoryQuizStore::new();
        let quiz_id = Uuid::new_v4();
        let participant = store.join_participant(quiz_id, "ann".into()).await.unwrap();
        let question_id = Uuid::new_v4();
        let record = AnswerRecordEntity {
            question_id,
            selected_option: 1,
            correct: true,
            answer_time_ms: 500,
        };

        let first = store
            .record_answer(participant.id, record.clone(), 1500)
            .await
            .unwrap();
        assert_eq!(first.map(|p| p.score), Some(1500));

        let second = store.record_answer(participant.id, record, 1500).await.unwrap();
        assert!(second.is_none());

        let stored = store.find_participant(participant.id).await.unwrap().unwrap();
        assert_eq!(stored.score, 1500);
        assert_eq!(stored.answers.len(), 1);
    }

    #[tokio::test]
    async fn tied_scores_rank_earlier_update_first() {
        let store = MemoryQuizStore::new();
        let quiz_id = Uuid::new_v4();
        let ann = store.join_participant(quiz_id, "ann".into()).await.unwrap();
        let bob = store.join_participant(quiz_id, "bob".into()).await.unwrap();

        let answer = |question_id| AnswerRecordEntity {
            question_id,
            selected_option: 0,
            correct: true,
            answer_time_ms: 100,
        };

        // Bob reaches 1000 before Ann does.
        store
            .record_answer(bob.id, answer(Uuid::new_v4()), 1000)
            .await
            .unwrap();
        store
            .record_answer(ann.id, answer(Uuid::new_v4()), 1000)
            .await
            .unwrap();

        let top = store.top_participants(quiz_id, 10).await.unwrap();
        assert_eq!(
            top.iter().map(|row| row.name.as_str()).collect::<Vec<_>>(),
            vec!["bob", "ann"]
        );
    }

    #[tokio::test]
    async fn join_participant_is_idempotent_per_name() {
        let store = MemoryQuizStore::new();
        let quiz_id = Uuid::new_v4();
        let first = store.join_participant(quiz_id, "ann".into()).await.unwrap();
        let again = store.join_participant(quiz_id, "ann".into()).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(store.count_participants(quiz_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn quizzes_list_newest_first() {
        let store = MemoryQuizStore::new();
        let older = quiz(100);
        let newer = quiz(200);
        store.save_quiz(older.clone()).await.unwrap();
        store.save_quiz(newer.clone()).await.unwrap();

        let listed = store.list_quizzes().await.unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }
}
