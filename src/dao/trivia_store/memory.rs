//! In-process [`TriviaStore`] used for local runs and tests.
//!
//! All records live behind a single async mutex. A transaction holds the lock for its whole
//! lifetime and works on a staged copy, so transactions are serialized and plain reads only
//! ever see committed state.

use std::{sync::Arc, time::SystemTime};

use futures::future::{self, BoxFuture};
use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::dao::{
    models::{AnswerEntity, AnswerEntryEntity, QuestionEntity, UserEntity},
    storage::{StorageError, StorageResult},
    trivia_store::{TriviaStore, TriviaTransaction},
};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    questions: IndexMap<Uuid, QuestionEntity>,
    answers: IndexMap<Uuid, AnswerEntity>,
    entries: IndexMap<(Uuid, Uuid), AnswerEntryEntity>,
    users: IndexMap<Uuid, UserEntity>,
}

impl MemoryData {
    fn current_question(&self) -> Option<QuestionEntity> {
        self.questions
            .values()
            .filter(|question| question.activated_at.is_some())
            .max_by_key(|question| question.activated_at)
            .cloned()
    }

    fn answers_for_question(&self, question_id: Uuid) -> Vec<AnswerEntity> {
        let mut answers: Vec<AnswerEntity> = self
            .answers
            .values()
            .filter(|answer| answer.question_id == question_id)
            .cloned()
            .collect();
        answers.sort_by_key(|answer| answer.position);
        answers
    }
}

/// Memory-backed [`TriviaStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryTriviaStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryTriviaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriviaStore for MemoryTriviaStore {
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn TriviaTransaction>>> {
        let data = self.data.clone();
        Box::pin(async move {
            let guard = data.lock_owned().await;
            let staged = (*guard).clone();
            Ok(Box::new(MemoryTransaction { guard, staged }) as Box<dyn TriviaTransaction>)
        })
    }

    fn current_question(&self) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(data.lock().await.current_question()) })
    }

    fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(data.lock().await.answers_for_question(question_id)) })
    }

    fn upsert_answer_entry(
        &self,
        entry: AnswerEntryEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerEntryEntity>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut data = data.lock().await;
            let key = (entry.user_id, entry.question_id);
            let stored = match data.entries.get_mut(&key) {
                Some(existing) => {
                    existing.answer_id = entry.answer_id;
                    existing.updated_at = entry.updated_at;
                    existing.clone()
                }
                None => {
                    data.entries.insert(key, entry.clone());
                    entry
                }
            };
            Ok(stored)
        })
    }

    fn find_answer_entry(
        &self,
        user_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntryEntity>>> {
        let data = self.data.clone();
        Box::pin(async move {
            Ok(data
                .lock()
                .await
                .entries
                .get(&(user_id, question_id))
                .cloned())
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(data.lock().await.users.get(&id).cloned()) })
    }

    fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut data = data.lock().await;
            let existing = data
                .users
                .values_mut()
                .find(|candidate| candidate.external_id == user.external_id);
            let stored = match existing {
                Some(existing) => {
                    existing.display_name = user.display_name;
                    existing.image_url = user.image_url;
                    existing.clone()
                }
                None => {
                    data.users.insert(user.id, user.clone());
                    user
                }
            };
            Ok(stored)
        })
    }

    fn top_users(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let data = self.data.clone();
        Box::pin(async move {
            let data = data.lock().await;
            let mut users: Vec<UserEntity> = data.users.values().cloned().collect();
            users.sort_by(|a, b| {
                b.points
                    .cmp(&a.points)
                    .then_with(|| a.display_name.cmp(&b.display_name))
            });
            users.truncate(count);
            Ok(users)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

/// Transaction over [`MemoryTriviaStore`]; writes go to `staged` until commit.
struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryData>,
    staged: MemoryData,
}

impl TriviaTransaction for MemoryTransaction {
    fn insert_question(
        &mut self,
        question: QuestionEntity,
        answers: Vec<AnswerEntity>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let result = if self.staged.questions.contains_key(&question.id) {
            Err(StorageError::conflict(format!(
                "question `{}` already exists",
                question.id
            )))
        } else {
            for answer in answers {
                self.staged.answers.insert(answer.id, answer);
            }
            self.staged.questions.insert(question.id, question);
            Ok(())
        };
        Box::pin(future::ready(result))
    }

    fn current_question(&mut self) -> BoxFuture<'_, StorageResult<Option<QuestionEntity>>> {
        Box::pin(future::ready(Ok(self.staged.current_question())))
    }

    fn dormant_questions(&mut self) -> BoxFuture<'_, StorageResult<Vec<QuestionEntity>>> {
        let dormant = self
            .staged
            .questions
            .values()
            .filter(|question| question.activated_at.is_none())
            .cloned()
            .collect();
        Box::pin(future::ready(Ok(dormant)))
    }

    fn activate_question(&mut self, id: Uuid, at: SystemTime) -> BoxFuture<'_, StorageResult<()>> {
        let result = match self.staged.questions.get_mut(&id) {
            Some(question) if question.activated_at.is_none() => {
                question.activated_at = Some(at);
                Ok(())
            }
            Some(_) => Err(StorageError::conflict(format!(
                "question `{id}` was already activated"
            ))),
            None => Err(StorageError::conflict(format!("question `{id}` does not exist"))),
        };
        Box::pin(future::ready(result))
    }

    fn award_points(
        &mut self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> BoxFuture<'_, StorageResult<u64>> {
        let winners: Vec<Uuid> = self
            .staged
            .entries
            .values()
            .filter(|entry| entry.question_id == question_id && entry.answer_id == answer_id)
            .map(|entry| entry.user_id)
            .collect();

        let mut credited = 0;
        for user_id in winners {
            if let Some(user) = self.staged.users.get_mut(&user_id) {
                user.points += 1;
                credited += 1;
            }
        }
        Box::pin(future::ready(Ok(credited)))
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Box::pin(future::ready(Ok(())))
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        drop(self);
        Box::pin(future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn question(text: &str) -> (QuestionEntity, Vec<AnswerEntity>) {
        let id = Uuid::new_v4();
        let answers: Vec<AnswerEntity> = ["Yes", "No"]
            .iter()
            .enumerate()
            .map(|(position, text)| AnswerEntity {
                id: Uuid::new_v4(),
                question_id: id,
                position: position as u8,
                text: (*text).into(),
            })
            .collect();
        let question = QuestionEntity {
            id,
            author_id: Uuid::new_v4(),
            text: text.into(),
            correct_answer_id: Some(answers[0].id),
            created_at: SystemTime::now(),
            activated_at: None,
        };
        (question, answers)
    }

    fn user(external_id: &str, name: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            display_name: name.into(),
            image_url: None,
            points: 0,
            created_at: SystemTime::now(),
        }
    }

    async fn insert(store: &MemoryTriviaStore, text: &str) -> (QuestionEntity, Vec<AnswerEntity>) {
        let (question, answers) = question(text);
        let mut tx = store.begin().await.unwrap();
        tx.insert_question(question.clone(), answers.clone())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (question, answers)
    }

    #[tokio::test]
    async fn committed_writes_become_visible() {
        let store = MemoryTriviaStore::new();
        let (question, answers) = insert(&store, "Is water wet?").await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.dormant_questions().await.unwrap(), vec![question.clone()]);
        drop(tx);
        assert_eq!(
            store.answers_for_question(question.id).await.unwrap(),
            answers
        );
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryTriviaStore::new();
        let (question, answers) = question("Never stored");
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_question(question.clone(), answers).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.dormant_questions().await.unwrap().is_empty());
        drop(tx);
        assert!(store.answers_for_question(question.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn current_question_has_latest_activation() {
        let store = MemoryTriviaStore::new();
        let (first, _) = insert(&store, "First").await;
        let (second, _) = insert(&store, "Second").await;
        assert!(store.current_question().await.unwrap().is_none());

        let now = SystemTime::now();
        let mut tx = store.begin().await.unwrap();
        tx.activate_question(first.id, now).await.unwrap();
        tx.activate_question(second.id, now + Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(tx.dormant_questions().await.unwrap().len(), 0);
        tx.commit().await.unwrap();

        let current = store.current_question().await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
    }

    #[tokio::test]
    async fn activating_twice_is_a_conflict() {
        let store = MemoryTriviaStore::new();
        let (question, _) = insert(&store, "Once only").await;

        let mut tx = store.begin().await.unwrap();
        tx.activate_question(question.id, SystemTime::now())
            .await
            .unwrap();
        let err = tx
            .activate_question(question.id, SystemTime::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn upsert_answer_entry_overwrites_choice_and_keeps_id() {
        let store = MemoryTriviaStore::new();
        let (question, answers) = insert(&store, "Pick one").await;
        let user_id = Uuid::new_v4();

        let first = store
            .upsert_answer_entry(AnswerEntryEntity {
                id: Uuid::new_v4(),
                user_id,
                question_id: question.id,
                answer_id: answers[0].id,
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();
        let second = store
            .upsert_answer_entry(AnswerEntryEntity {
                id: Uuid::new_v4(),
                user_id,
                question_id: question.id,
                answer_id: answers[1].id,
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = store
            .find_answer_entry(user_id, question.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answer_id, answers[1].id);
    }

    #[tokio::test]
    async fn award_points_credits_matching_entries_only() {
        let store = MemoryTriviaStore::new();
        let (question, answers) = insert(&store, "Scored").await;
        let winner = store.upsert_user(user("U1", "Ada")).await.unwrap();
        let loser = store.upsert_user(user("U2", "Bob")).await.unwrap();
        for (who, answer) in [(&winner, &answers[0]), (&loser, &answers[1])] {
            store
                .upsert_answer_entry(AnswerEntryEntity {
                    id: Uuid::new_v4(),
                    user_id: who.id,
                    question_id: question.id,
                    answer_id: answer.id,
                    updated_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        let credited = tx.award_points(question.id, answers[0].id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(credited, 1);
        assert_eq!(store.find_user(winner.id).await.unwrap().unwrap().points, 1);
        assert_eq!(store.find_user(loser.id).await.unwrap().unwrap().points, 0);
    }

    #[tokio::test]
    async fn upsert_user_preserves_identity_and_points() {
        let store = MemoryTriviaStore::new();
        let original = store.upsert_user(user("U1", "Ada")).await.unwrap();

        let mut renamed = user("U1", "Ada Lovelace");
        renamed.points = 42;
        let stored = store.upsert_user(renamed).await.unwrap();

        assert_eq!(stored.id, original.id);
        assert_eq!(stored.display_name, "Ada Lovelace");
        assert_eq!(stored.points, 0);
    }

    #[tokio::test]
    async fn top_users_orders_by_points_then_name() {
        let store = MemoryTriviaStore::new();
        let ada = store.upsert_user(user("U1", "Ada")).await.unwrap();
        store.upsert_user(user("U2", "Bob")).await.unwrap();
        store.upsert_user(user("U3", "Cy")).await.unwrap();
        let (question, answers) = insert(&store, "Leader").await;
        store
            .upsert_answer_entry(AnswerEntryEntity {
                id: Uuid::new_v4(),
                user_id: ada.id,
                question_id: question.id,
                answer_id: answers[0].id,
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.award_points(question.id, answers[0].id).await.unwrap();
        tx.commit().await.unwrap();

        let top = store.top_users(2).await.unwrap();
        let names: Vec<&str> = top.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bob"]);
    }
}
