/// In-process store used by tests and storage-free development runs.
pub mod memory;
/// Database model definitions.
pub mod models;
/// MongoDB-backed store implementation.
#[cfg(feature = "mongo-store")]
pub mod mongodb;
/// Storage abstraction layer for database operations.
pub mod storage;
