/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Question, ledger, and user storage backends.
pub mod trivia_store;
