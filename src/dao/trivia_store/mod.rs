pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, AnswerEntryEntity, QuestionEntity, UserEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for questions, the answer ledger, and users.
///
/// Single-statement operations are exposed directly; anything that must change several
/// records atomically goes through [`TriviaStore::begin`].
pub trait TriviaStore: Send + Sync {
    /// Open a transaction. Dropping the handle without committing discards its writes.
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn TriviaTransaction>>>;
    /// Question with the latest activation timestamp, if any was ever activated.
    fn current_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Answers of a question ordered by creation.
    fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    /// Insert the entry, or overwrite the chosen answer of the existing (user, question) row.
    /// Returns the row as stored.
    fn upsert_answer_entry(
        &self,
        entry: AnswerEntryEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerEntryEntity>>;
    fn find_answer_entry(
        &self,
        user_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntryEntity>>>;
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Insert a user, or refresh the profile fields of the user sharing its external id.
    /// Points and the internal id of an existing user are preserved.
    fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>>;
    /// Users ordered by points (descending) then display name.
    fn top_users(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Unit of work spanning several records. Reads observe the transaction's own writes.
pub trait TriviaTransaction: Send {
    /// Insert a question together with all of its answers.
    fn insert_question(
        &mut self,
        question: QuestionEntity,
        answers: Vec<AnswerEntity>,
    ) -> BoxFuture<'_, StorageResult<()>>;
    fn current_question(&mut self) -> BoxFuture<'_, StorageResult<Option<QuestionEntity>>>;
    /// Every question that was never activated.
    fn dormant_questions(&mut self) -> BoxFuture<'_, StorageResult<Vec<QuestionEntity>>>;
    /// Stamp a dormant question as activated. Fails with a conflict if it was already activated.
    fn activate_question(&mut self, id: Uuid, at: SystemTime) -> BoxFuture<'_, StorageResult<()>>;
    /// Add one point to every user whose ledger entry for `question_id` chose `answer_id`.
    /// Returns the number of users credited.
    fn award_points(
        &mut self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> BoxFuture<'_, StorageResult<u64>>;
    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
}
