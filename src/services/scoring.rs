use tracing::{debug, info};

use crate::dao::{models::QuestionEntity, storage::StorageResult, trivia_store::TriviaTransaction};

/// Credit one point to every user whose ledger entry for `closing` chose its correct answer.
///
/// Runs inside the rotation transaction, so the ledger is read exactly once, at closure.
/// Returns the number of users credited; zero when the question has no correct answer.
pub async fn score_round(
    tx: &mut dyn TriviaTransaction,
    closing: &QuestionEntity,
) -> StorageResult<u64> {
    let Some(correct_answer_id) = closing.correct_answer_id else {
        debug!(question_id = %closing.id, "closing round has no correct answer; nothing to score");
        return Ok(0);
    };

    let credited = tx.award_points(closing.id, correct_answer_id).await?;
    info!(question_id = %closing.id, credited, "round scored");
    Ok(credited)
}
