//! MongoDB implementation of the [`QuizStore`](crate::dao::storage::QuizStore) trait.

mod connection;
mod error;
mod models;
pub mod config;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoQuizStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
