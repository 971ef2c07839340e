use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("environment variable `{var}` is not set")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save quiz `{id}`")]
    SaveQuiz {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load quiz")]
    LoadQuiz {
        #[source]
        source: MongoError,
    },
    #[error("failed to list quizzes")]
    ListQuizzes {
        #[source]
        source: MongoError,
    },
    #[error("failed to update quiz `{id}`")]
    UpdateQuiz {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete quiz `{id}`")]
    DeleteQuiz {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save question `{id}`")]
    SaveQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load question `{id}`")]
    LoadQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list questions of quiz `{quiz_id}`")]
    ListQuestions {
        quiz_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete question(s)")]
    DeleteQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to join participant to quiz `{quiz_id}`")]
    JoinParticipant {
        quiz_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load participant `{id}`")]
    LoadParticipant {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update participant `{id}`")]
    UpdateParticipant {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to query participants of quiz `{quiz_id}`")]
    QueryParticipants {
        quiz_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to serialize answer record")]
    EncodeAnswer {
        #[source]
        source: mongodb::bson::ser::Error,
    },
    #[error("upsert for participant in quiz `{quiz_id}` returned no document")]
    UpsertReturnedNothing { quiz_id: Uuid },
}
