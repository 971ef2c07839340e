//! Connection settings for the MongoDB backend.

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Parsed client options plus the target database name.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed MongoDB client options.
    pub options: ClientOptions,
    /// Database holding the quiz collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Build a configuration from a connection URI and optional database name.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("live_quiz").to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Build a configuration from `MONGO_URI` and `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI")
            .map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = std::env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}
