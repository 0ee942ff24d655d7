use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::{DateTime, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoAnswerDocument, MongoAnswerEntryDocument, MongoQuestionDocument, MongoUserDocument,
        doc_id, to_bson_uuid,
    },
};
use crate::dao::{
    models::{AnswerEntity, AnswerEntryEntity, QuestionEntity, UserEntity},
    storage::StorageResult,
    trivia_store::{TriviaStore, TriviaTransaction},
};

const QUESTION_COLLECTION_NAME: &str = "questions";
const ANSWER_COLLECTION_NAME: &str = "answers";
const ENTRY_COLLECTION_NAME: &str = "answer_entries";
const USER_COLLECTION_NAME: &str = "users";

/// MongoDB-backed [`TriviaStore`]. Multi-document work runs inside client-session
/// transactions, which requires a replica set deployment.
#[derive(Clone)]
pub struct MongoTriviaStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
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
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoTriviaStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let indexes: [(&'static str, &'static str, mongodb::bson::Document, bool); 5] = [
            (
                ENTRY_COLLECTION_NAME,
                "user_id,question_id",
                doc! {"user_id": 1, "question_id": 1},
                true,
            ),
            (USER_COLLECTION_NAME, "external_id", doc! {"external_id": 1}, true),
            (USER_COLLECTION_NAME, "points", doc! {"points": -1}, false),
            (
                QUESTION_COLLECTION_NAME,
                "activated_at",
                doc! {"activated_at": -1},
                false,
            ),
            (
                ANSWER_COLLECTION_NAME,
                "question_id,position",
                doc! {"question_id": 1, "position": 1},
                false,
            ),
        ];

        for (collection_name, index_name, keys, unique) in indexes {
            let collection = database.collection::<mongodb::bson::Document>(collection_name);
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(Some(unique)).build())
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: index_name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn question_collection(&self) -> Collection<MongoQuestionDocument> {
        self.database()
            .await
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn answer_collection(&self) -> Collection<MongoAnswerDocument> {
        self.database()
            .await
            .collection::<MongoAnswerDocument>(ANSWER_COLLECTION_NAME)
    }

    async fn entry_collection(&self) -> Collection<MongoAnswerEntryDocument> {
        self.database()
            .await
            .collection::<MongoAnswerEntryDocument>(ENTRY_COLLECTION_NAME)
    }

    async fn user_collection(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn begin_transaction(&self) -> MongoResult<MongoTransaction> {
        let client = self.client().await;
        let database = self.database().await;
        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction {
                operation: "start session for",
                source,
            })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction {
                operation: "start",
                source,
            })?;

        Ok(MongoTransaction { session, database })
    }

    async fn current_question(&self) -> MongoResult<Option<QuestionEntity>> {
        let collection = self.question_collection().await;
        let document = collection
            .find_one(doc! {"activated_at": {"$ne": null}})
            .sort(doc! {"activated_at": -1})
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?;
        Ok(document.map(Into::into))
    }

    async fn answers_for_question(&self, question_id: Uuid) -> MongoResult<Vec<AnswerEntity>> {
        let collection = self.answer_collection().await;
        let documents: Vec<MongoAnswerDocument> = collection
            .find(doc! {"question_id": to_bson_uuid(question_id)})
            .sort(doc! {"position": 1})
            .await
            .map_err(|source| MongoDaoError::LoadAnswers {
                id: question_id,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadAnswers {
                id: question_id,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn upsert_answer_entry(&self, entry: AnswerEntryEntity) -> MongoResult<AnswerEntryEntity> {
        let question_id = entry.question_id;
        let collection = self.entry_collection().await;

        // The unique (user_id, question_id) index makes concurrent upserts of one pair converge.
        let stored = collection
            .find_one_and_update(
                doc! {
                    "user_id": to_bson_uuid(entry.user_id),
                    "question_id": to_bson_uuid(entry.question_id),
                },
                doc! {
                    "$set": {
                        "answer_id": to_bson_uuid(entry.answer_id),
                        "updated_at": DateTime::from_system_time(entry.updated_at),
                    },
                    "$setOnInsert": { "_id": to_bson_uuid(entry.id) },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveAnswerEntry {
                question_id,
                source,
            })?
            .ok_or(MongoDaoError::MissingUpsertResult { question_id })?;

        Ok(stored.into())
    }

    async fn find_answer_entry(
        &self,
        user_id: Uuid,
        question_id: Uuid,
    ) -> MongoResult<Option<AnswerEntryEntity>> {
        let collection = self.entry_collection().await;
        let document = collection
            .find_one(doc! {
                "user_id": to_bson_uuid(user_id),
                "question_id": to_bson_uuid(question_id),
            })
            .await
            .map_err(|source| MongoDaoError::LoadAnswerEntry {
                question_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_user(&self, id: Uuid) -> MongoResult<Option<UserEntity>> {
        let collection = self.user_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadUser { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn upsert_user(&self, user: UserEntity) -> MongoResult<UserEntity> {
        let collection = self.user_collection().await;
        let external_id = user.external_id.clone();

        let stored = collection
            .find_one_and_update(
                doc! {"external_id": user.external_id.clone()},
                doc! {
                    "$set": {
                        "display_name": user.display_name.clone(),
                        "image_url": user.image_url.clone(),
                    },
                    "$setOnInsert": {
                        "_id": to_bson_uuid(user.id),
                        "points": 0_i64,
                        "created_at": DateTime::from_system_time(user.created_at),
                    },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveUser {
                external_id: external_id.clone(),
                source,
            })?
            .ok_or(MongoDaoError::MissingUserUpsertResult { external_id })?;

        Ok(stored.into())
    }

    async fn top_users(&self, count: usize) -> MongoResult<Vec<UserEntity>> {
        let collection = self.user_collection().await;
        let documents: Vec<MongoUserDocument> = collection
            .find(doc! {})
            .sort(doc! {"points": -1, "display_name": 1})
            .limit(i64::try_from(count).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl TriviaStore for MongoTriviaStore {
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn TriviaTransaction>>> {
        let store = self.clone();
        Box::pin(async move {
            let tx = store.begin_transaction().await?;
            Ok(Box::new(tx) as Box<dyn TriviaTransaction>)
        })
    }

    fn current_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.current_question().await.map_err(Into::into) })
    }

    fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .answers_for_question(question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn upsert_answer_entry(
        &self,
        entry: AnswerEntryEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerEntryEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_answer_entry(entry).await.map_err(Into::into) })
    }

    fn find_answer_entry(
        &self,
        user_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_answer_entry(user_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(id).await.map_err(Into::into) })
    }

    fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_user(user).await.map_err(Into::into) })
    }

    fn top_users(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.top_users(count).await.map_err(Into::into) })
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

/// Open multi-document transaction. The driver aborts it if the session is dropped uncommitted.
struct MongoTransaction {
    session: ClientSession,
    database: Database,
}

impl MongoTransaction {
    fn questions(&self) -> Collection<MongoQuestionDocument> {
        self.database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn insert_question(
        &mut self,
        question: QuestionEntity,
        answers: Vec<AnswerEntity>,
    ) -> MongoResult<()> {
        let id = question.id;
        let document: MongoQuestionDocument = question.into();
        self.questions()
            .insert_one(&document)
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::SaveQuestion { id, source })?;

        let answer_documents: Vec<MongoAnswerDocument> =
            answers.into_iter().map(Into::into).collect();
        if !answer_documents.is_empty() {
            self.database
                .collection::<MongoAnswerDocument>(ANSWER_COLLECTION_NAME)
                .insert_many(&answer_documents)
                .session(&mut self.session)
                .await
                .map_err(|source| MongoDaoError::SaveQuestion { id, source })?;
        }

        Ok(())
    }

    async fn current_question(&mut self) -> MongoResult<Option<QuestionEntity>> {
        let document = self
            .questions()
            .find_one(doc! {"activated_at": {"$ne": null}})
            .sort(doc! {"activated_at": -1})
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?;
        Ok(document.map(Into::into))
    }

    async fn dormant_questions(&mut self) -> MongoResult<Vec<QuestionEntity>> {
        let mut cursor = self
            .questions()
            .find(doc! {"activated_at": null})
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?;
        let documents: Vec<MongoQuestionDocument> = cursor
            .stream(&mut self.session)
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn activate_question(&mut self, id: Uuid, at: SystemTime) -> MongoResult<()> {
        let result = self
            .questions()
            .update_one(
                doc! {"_id": to_bson_uuid(id), "activated_at": null},
                doc! {"$set": {"activated_at": DateTime::from_system_time(at)}},
            )
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::ActivateQuestion { id, source })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::ActivationConflict { id });
        }
        Ok(())
    }

    async fn award_points(&mut self, question_id: Uuid, answer_id: Uuid) -> MongoResult<u64> {
        let mut cursor = self
            .database
            .collection::<MongoAnswerEntryDocument>(ENTRY_COLLECTION_NAME)
            .find(doc! {
                "question_id": to_bson_uuid(question_id),
                "answer_id": to_bson_uuid(answer_id),
            })
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::AwardPoints {
                id: question_id,
                source,
            })?;
        let entries: Vec<MongoAnswerEntryDocument> = cursor
            .stream(&mut self.session)
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::AwardPoints {
                id: question_id,
                source,
            })?;

        let winners: Vec<mongodb::bson::Uuid> = entries
            .into_iter()
            .map(|document| to_bson_uuid(AnswerEntryEntity::from(document).user_id))
            .collect();
        if winners.is_empty() {
            return Ok(0);
        }

        let result = self
            .database
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
            .update_many(
                doc! {"_id": {"$in": winners}},
                doc! {"$inc": {"points": 1_i64}},
            )
            .session(&mut self.session)
            .await
            .map_err(|source| MongoDaoError::AwardPoints {
                id: question_id,
                source,
            })?;

        Ok(result.modified_count)
    }
}

impl TriviaTransaction for MongoTransaction {
    fn insert_question(
        &mut self,
        question: QuestionEntity,
        answers: Vec<AnswerEntity>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            MongoTransaction::insert_question(self, question, answers)
                .await
                .map_err(Into::into)
        })
    }

    fn current_question(&mut self) -> BoxFuture<'_, StorageResult<Option<QuestionEntity>>> {
        Box::pin(async move {
            MongoTransaction::current_question(self)
                .await
                .map_err(Into::into)
        })
    }

    fn dormant_questions(&mut self) -> BoxFuture<'_, StorageResult<Vec<QuestionEntity>>> {
        Box::pin(async move {
            MongoTransaction::dormant_questions(self)
                .await
                .map_err(Into::into)
        })
    }

    fn activate_question(&mut self, id: Uuid, at: SystemTime) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            MongoTransaction::activate_question(self, id, at)
                .await
                .map_err(Into::into)
        })
    }

    fn award_points(
        &mut self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> BoxFuture<'_, StorageResult<u64>> {
        Box::pin(async move {
            MongoTransaction::award_points(self, question_id, answer_id)
                .await
                .map_err(Into::into)
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        let mut session = self.session;
        Box::pin(async move {
            session
                .commit_transaction()
                .await
                .map_err(|source| MongoDaoError::Transaction {
                    operation: "commit",
                    source,
                })?;
            Ok(())
        })
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        let mut session = self.session;
        Box::pin(async move {
            session
                .abort_transaction()
                .await
                .map_err(|source| MongoDaoError::Transaction {
                    operation: "abort",
                    source,
                })?;
            debug!("MongoDB transaction aborted");
            Ok(())
        })
    }
}
