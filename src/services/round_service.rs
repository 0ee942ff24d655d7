use tracing::debug;

use crate::{
    dto::{question::QuestionDetails, round::RoundStatusResponse, user::UserSummary},
    error::ServiceError,
    state::SharedState,
};

/// Current question and its answers; `NotFound` before the first rotation.
pub async fn current_question(state: &SharedState) -> Result<QuestionDetails, ServiceError> {
    let store = state.require_trivia_store().await?;
    let Some(question) = store.current_question().await? else {
        return Err(ServiceError::NotFound("no question has been activated yet".into()));
    };
    let answers = store.answers_for_question(question.id).await?;
    Ok(QuestionDetails::new(&question, &answers))
}

/// Status view combining the current round, its author, and the leaderboard.
pub async fn round_status(state: &SharedState) -> Result<RoundStatusResponse, ServiceError> {
    let store = state.require_trivia_store().await?;

    let (current, author) = match store.current_question().await? {
        Some(question) => {
            let answers = store.answers_for_question(question.id).await?;
            let author = store.find_user(question.author_id).await?;
            if author.is_none() {
                debug!(question_id = %question.id, author_id = %question.author_id, "author of current question is unknown");
            }
            (
                Some(QuestionDetails::new(&question, &answers)),
                author.map(UserSummary::from),
            )
        }
        None => (None, None),
    };

    let leaderboard = store
        .top_users(state.config().leaderboard_size())
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(RoundStatusResponse {
        current,
        author,
        leaderboard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        rotation_service,
        test_support::{memory_state, register, submit},
    };

    #[tokio::test]
    async fn nothing_is_current_before_first_rotation() {
        let state = memory_state().await;
        assert!(matches!(
            current_question(&state).await,
            Err(ServiceError::NotFound(_))
        ));

        let status = round_status(&state).await.unwrap();
        assert!(status.current.is_none());
        assert!(status.author.is_none());
        assert!(status.leaderboard.is_empty());
    }

    #[tokio::test]
    async fn status_reports_current_round_and_author() {
        let state = memory_state().await;
        let author = register(&state, "author").await;
        let submitted = submit(&state, author, &["Yes", "No"], 1).await;
        rotation_service::rotate(&state).await.unwrap();

        let current = current_question(&state).await.unwrap();
        assert_eq!(current.question.id, submitted.question.id);
        assert!(current.question.activated_at.is_some());
        assert_eq!(current.answers.len(), 2);

        let status = round_status(&state).await.unwrap();
        assert_eq!(
            status.current.map(|details| details.question.id),
            Some(submitted.question.id)
        );
        assert_eq!(status.author.map(|user| user.id), Some(author));
        assert_eq!(status.leaderboard.len(), 1);
    }
}
