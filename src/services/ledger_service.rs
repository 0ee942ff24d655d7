use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::AnswerEntryEntity,
    dto::question::{AnswerRecordedResponse, RecordAnswerRequest},
    error::ServiceError,
    state::SharedState,
};

/// Record the user's choice for the current round, replacing any earlier choice.
///
/// Answers for any question other than the current one are rejected with
/// [`ServiceError::NoActiveRound`]. No points are awarded here.
pub async fn record_answer(
    state: &SharedState,
    request: RecordAnswerRequest,
) -> Result<AnswerRecordedResponse, ServiceError> {
    let RecordAnswerRequest {
        user_id,
        question_id,
        answer,
    } = request;
    let store = state.require_trivia_store().await?;

    match store.current_question().await? {
        Some(current) if current.id == question_id => {}
        _ => return Err(ServiceError::NoActiveRound),
    }

    let answers = store.answers_for_question(question_id).await?;
    if answer == 0 || answer > answers.len() {
        return Err(ServiceError::InvalidAnswerIndex {
            count: answers.len(),
        });
    }
    let chosen = &answers[answer - 1];

    if store.find_user(user_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("user `{user_id}` not found")));
    }

    let entry = store
        .upsert_answer_entry(AnswerEntryEntity {
            id: Uuid::new_v4(),
            user_id,
            question_id,
            answer_id: chosen.id,
            updated_at: SystemTime::now(),
        })
        .await?;

    debug!(
        user_id = %user_id,
        question_id = %question_id,
        answer,
        "answer recorded"
    );
    Ok(AnswerRecordedResponse::new(&entry, answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        rotation_service,
        test_support::{memory_state, register, submit},
    };

    fn pick(user_id: Uuid, question_id: Uuid, answer: usize) -> RecordAnswerRequest {
        RecordAnswerRequest {
            user_id,
            question_id,
            answer,
        }
    }

    #[tokio::test]
    async fn latest_choice_wins() {
        let state = memory_state().await;
        let player = register(&state, "player").await;
        let question = submit(&state, player, &["Yes", "No"], 1).await.question;
        rotation_service::rotate(&state).await.unwrap();

        let first = record_answer(&state, pick(player, question.id, 1))
            .await
            .unwrap();
        let second = record_answer(&state, pick(player, question.id, 2))
            .await
            .unwrap();

        assert_eq!(first.entry_id, second.entry_id);
        assert_eq!(second.answer, 2);

        let store = state.require_trivia_store().await.unwrap();
        let stored = store
            .find_answer_entry(player, question.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answer_id, second.answer_id);
    }

    #[tokio::test]
    async fn out_of_range_index_reports_answer_count() {
        let state = memory_state().await;
        let player = register(&state, "player").await;
        let question = submit(&state, player, &["Yes", "No"], 1).await.question;
        rotation_service::rotate(&state).await.unwrap();

        for index in [0, 5] {
            let err = record_answer(&state, pick(player, question.id, index))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidAnswerIndex { count: 2 }));
        }
    }

    #[tokio::test]
    async fn answers_need_the_current_round() {
        let state = memory_state().await;
        let player = register(&state, "player").await;
        let first = submit(&state, player, &["Yes", "No"], 1).await.question;

        assert!(matches!(
            record_answer(&state, pick(player, first.id, 1)).await,
            Err(ServiceError::NoActiveRound)
        ));

        rotation_service::rotate(&state).await.unwrap();
        let dormant = submit(&state, player, &["Up", "Down"], 2).await.question;
        assert!(matches!(
            record_answer(&state, pick(player, dormant.id, 1)).await,
            Err(ServiceError::NoActiveRound)
        ));
    }

    #[tokio::test]
    async fn unknown_user_cannot_answer() {
        let state = memory_state().await;
        let author = register(&state, "author").await;
        let question = submit(&state, author, &["Yes", "No"], 1).await.question;
        rotation_service::rotate(&state).await.unwrap();

        assert!(matches!(
            record_answer(&state, pick(Uuid::new_v4(), question.id, 1)).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
