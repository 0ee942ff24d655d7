mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoTriviaStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::ActivationConflict { id } => {
                StorageError::conflict(format!("question `{id}` was already activated"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
