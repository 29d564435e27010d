use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
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
    #[error("version {version} does not fit a MongoDB integer")]
    VersionOverflow { version: u64 },
    #[error("stored key `{key}` is not a UUID")]
    InvalidKey {
        key: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to save room `{id}`")]
    SaveRoom {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load room `{id}`")]
    LoadRoom {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game of room `{room_id}`")]
    SaveGame {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game of room `{room_id}`")]
    LoadGame {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    /// The game record changed since it was read.
    #[error("game record `{key}` was modified concurrently")]
    Conflict { key: String },
    #[error("failed to record a win in room `{room_id}`")]
    RecordWin {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to record history of room `{room_id}`")]
    RecordHistory {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list wins of room `{room_id}`")]
    ListWins {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list history of room `{room_id}`")]
    ListHistory {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
}

/// Whether the server rejected a write because the `_id` already exists.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        _ => false,
    }
}
