//! MongoDB-backed [`QuizStore`].

use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, doc, to_bson},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoAnswerRecord, MongoParticipantDocument, MongoQuestionDocument, MongoQuizDocument,
        doc_id,
    },
};
use crate::dao::{
    models::{
        AnswerRecordEntity, LeaderboardRowEntity, ParticipantEntity, QuestionEntity, QuizEntity,
    },
    storage::{QuizStore, StorageResult},
};

const QUIZ_COLLECTION: &str = "quizzes";
const QUESTION_COLLECTION: &str = "questions";
const PARTICIPANT_COLLECTION: &str = "participants";

/// Clonable handle over a reconnectable MongoDB session.
#[derive(Clone)]
pub struct MongoQuizStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let quizzes = database.collection::<MongoQuizDocument>(QUIZ_COLLECTION);
        let join_code_index = IndexModel::builder()
            .keys(doc! {"join_code": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("quiz_join_code_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        quizzes
            .create_index(join_code_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUIZ_COLLECTION,
                index: "join_code",
                source,
            })?;

        let questions = database.collection::<MongoQuestionDocument>(QUESTION_COLLECTION);
        let question_order_index = IndexModel::builder()
            .keys(doc! {"quiz_id": 1, "created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_quiz_order_idx".to_owned()))
                    .build(),
            )
            .build();
        questions
            .create_index(question_order_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION,
                index: "quiz_id,created_at",
                source,
            })?;

        let participants = database.collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION);
        let participant_name_index = IndexModel::builder()
            .keys(doc! {"quiz_id": 1, "name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("participant_name_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        participants
            .create_index(participant_name_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PARTICIPANT_COLLECTION,
                index: "quiz_id,name",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn quizzes(&self) -> Collection<MongoQuizDocument> {
        self.database()
            .await
            .collection::<MongoQuizDocument>(QUIZ_COLLECTION)
    }

    async fn questions(&self) -> Collection<MongoQuestionDocument> {
        self.database()
            .await
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION)
    }

    async fn participants(&self) -> Collection<MongoParticipantDocument> {
        self.database()
            .await
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION)
    }

    async fn save_quiz(&self, quiz: QuizEntity) -> MongoResult<()> {
        let id = quiz.id;
        let document: MongoQuizDocument = quiz.into();
        self.quizzes()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveQuiz { id, source })?;
        Ok(())
    }

    async fn find_quiz(&self, id: Uuid) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .quizzes()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { source })?;
        Ok(document.map(Into::into))
    }

    async fn find_quiz_by_code(&self, code: String) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .quizzes()
            .await
            .find_one(doc! {"join_code": code})
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { source })?;
        Ok(document.map(Into::into))
    }

    async fn list_quizzes(&self) -> MongoResult<Vec<QuizEntity>> {
        let documents: Vec<MongoQuizDocument> = self
            .quizzes()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_quiz(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .quizzes()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteQuiz { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn join_code_exists(&self, code: String) -> MongoResult<bool> {
        Ok(self.find_quiz_by_code(code).await?.is_some())
    }

    async fn update_quiz(&self, id: Uuid, update: mongodb::bson::Document) -> MongoResult<()> {
        self.quizzes()
            .await
            .update_one(doc_id(id), update)
            .await
            .map_err(|source| MongoDaoError::UpdateQuiz { id, source })?;
        Ok(())
    }

    async fn join_participant(
        &self,
        quiz_id: Uuid,
        name: String,
    ) -> MongoResult<ParticipantEntity> {
        let now = DateTime::from_system_time(SystemTime::now());
        let on_insert =
            MongoParticipantDocument::on_insert(Uuid::new_v4(), quiz_id, now);

        let document = self
            .participants()
            .await
            .find_one_and_update(
                doc! {"quiz_id": quiz_id.to_string(), "name": &name},
                doc! {"$setOnInsert": on_insert},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::JoinParticipant { quiz_id, source })?
            .ok_or(MongoDaoError::UpsertReturnedNothing { quiz_id })?;

        Ok(document.into())
    }

    async fn record_answer(
        &self,
        participant_id: Uuid,
        record: AnswerRecordEntity,
        delta: u32,
    ) -> MongoResult<Option<ParticipantEntity>> {
        let wire: MongoAnswerRecord = record.into();
        let answer = to_bson(&wire).map_err(|source| MongoDaoError::EncodeAnswer { source })?;

        // Single atomic update; the `$ne` filter rejects duplicates for the
        // same question without re-scoring.
        let updated = self
            .participants()
            .await
            .find_one_and_update(
                doc! {
                    "_id": participant_id.to_string(),
                    "answers.question_id": { "$ne": wire.question_id.clone() },
                },
                doc! {
                    "$inc": { "score": delta as i64 },
                    "$push": { "answers": answer },
                    "$set": { "score_updated_at": DateTime::from_system_time(SystemTime::now()) },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateParticipant {
                id: participant_id,
                source,
            })?;

        Ok(updated.map(Into::into))
    }

    async fn top_participants(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> MongoResult<Vec<LeaderboardRowEntity>> {
        let documents: Vec<MongoParticipantDocument> = self
            .participants()
            .await
            .find(doc! {"quiz_id": quiz_id.to_string()})
            .sort(doc! {"score": -1, "score_updated_at": 1})
            .limit(limit as i64)
            .await
            .map_err(|source| MongoDaoError::QueryParticipants { quiz_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryParticipants { quiz_id, source })?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let participant: ParticipantEntity = document.into();
                LeaderboardRowEntity {
                    name: participant.name,
                    score: participant.score,
                }
            })
            .collect())
    }
}

impl QuizStore for MongoQuizStore {
    fn save_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_quiz(quiz).await.map_err(Into::into) })
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_quiz(id).await.map_err(Into::into) })
    }

    fn find_quiz_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_quiz_by_code(code).await.map_err(Into::into) })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_quizzes().await.map_err(Into::into) })
    }

    fn delete_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_quiz(id).await.map_err(Into::into) })
    }

    fn join_code_exists(&self, code: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.join_code_exists(code).await.map_err(Into::into) })
    }

    fn mark_quiz_live(
        &self,
        id: Uuid,
        started_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_quiz(
                    id,
                    doc! {"$set": {
                        "is_live": true,
                        "current_question_index": 0_i64,
                        "started_at": DateTime::from_system_time(started_at),
                    }},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn mark_quiz_ended(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_quiz(
                    id,
                    doc! {"$set": {"is_live": false, "current_question_index": 0_i64}},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn set_question_index(&self, id: Uuid, index: u32) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_quiz(id, doc! {"$set": {"current_question_index": index as i64}})
                .await
                .map_err(Into::into)
        })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = question.id;
            let document: MongoQuestionDocument = question.into();
            store
                .questions()
                .await
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveQuestion { id, source })?;
            Ok(())
        })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .questions()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::LoadQuestion { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn list_questions(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents: Vec<MongoQuestionDocument> = store
                .questions()
                .await
                .find(doc! {"quiz_id": quiz_id.to_string()})
                .sort(doc! {"created_at": 1})
                .await
                .map_err(|source| MongoDaoError::ListQuestions { quiz_id, source })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListQuestions { quiz_id, source })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let result = store
                .questions()
                .await
                .delete_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::DeleteQuestions { source })?;
            Ok(result.deleted_count > 0)
        })
    }

    fn delete_questions(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let result = store
                .questions()
                .await
                .delete_many(doc! {"quiz_id": quiz_id.to_string()})
                .await
                .map_err(|source| MongoDaoError::DeleteQuestions { source })?;
            Ok(result.deleted_count)
        })
    }

    fn join_participant(
        &self,
        quiz_id: Uuid,
        name: String,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>> {
        let store = self.clone();
        Box::pin(async move { store.join_participant(quiz_id, name).await.map_err(Into::into) })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .participants()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::LoadParticipant { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn set_participant_connection(
        &self,
        id: Uuid,
        connection: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let value = match connection {
                Some(connection) => mongodb::bson::Bson::String(connection.to_string()),
                None => mongodb::bson::Bson::Null,
            };
            store
                .participants()
                .await
                .update_one(doc_id(id), doc! {"$set": {"connection_id": value}})
                .await
                .map_err(|source| MongoDaoError::UpdateParticipant { id, source })?;
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
            store
                .record_answer(participant_id, record, delta)
                .await
                .map_err(Into::into)
        })
    }

    fn top_participants(
        &self,
        quiz_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .top_participants(quiz_id, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn count_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let count = store
                .participants()
                .await
                .count_documents(doc! {"quiz_id": quiz_id.to_string()})
                .await
                .map_err(|source| MongoDaoError::QueryParticipants { quiz_id, source })?;
            Ok(count)
        })
    }

    fn delete_participants(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let result = store
                .participants()
                .await
                .delete_many(doc! {"quiz_id": quiz_id.to_string()})
                .await
                .map_err(|source| MongoDaoError::QueryParticipants { quiz_id, source })?;
            Ok(result.deleted_count)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
