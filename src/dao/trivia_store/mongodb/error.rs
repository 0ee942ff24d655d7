use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
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
    #[error("failed to {operation} transaction")]
    Transaction {
        operation: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save question `{id}`")]
    SaveQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load questions")]
    LoadQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to load answers of question `{id}`")]
    LoadAnswers {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to activate question `{id}`")]
    ActivateQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("question `{id}` was already activated")]
    ActivationConflict { id: Uuid },
    #[error("failed to award points for question `{id}`")]
    AwardPoints {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save answer entry for question `{question_id}`")]
    SaveAnswerEntry {
        question_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load answer entry for question `{question_id}`")]
    LoadAnswerEntry {
        question_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("upsert of answer entry for question `{question_id}` returned no document")]
    MissingUpsertResult { question_id: Uuid },
    #[error("failed to save user `{external_id}`")]
    SaveUser {
        external_id: String,
        #[source]
        source: MongoError,
    },
    #[error("upsert of user `{external_id}` returned no document")]
    MissingUserUpsertResult { external_id: String },
    #[error("failed to load user `{id}`")]
    LoadUser {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list users")]
    ListUsers {
        #[source]
        source: MongoError,
    },
}
