use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerEntity, QuestionEntity},
    dto::question::{AnswerSummary, CreateQuestionRequest, QuestionDetails},
    error::ServiceError,
    state::SharedState,
};

/// Persist a new dormant question together with its answers in a single transaction.
pub async fn create_question(
    state: &SharedState,
    request: CreateQuestionRequest,
) -> Result<QuestionDetails, ServiceError> {
    validate_question(&request)?;

    let store = state.require_trivia_store().await?;
    if store.find_user(request.author_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "user `{}` not found",
            request.author_id
        )));
    }

    let (question, answers) = build_question(request, SystemTime::now());

    let mut tx = store.begin().await?;
    if let Err(err) = tx.insert_question(question.clone(), answers.clone()).await {
        if let Err(abort_err) = tx.abort().await {
            warn!(question_id = %question.id, error = %abort_err, "failed to abort question insert");
        }
        return Err(err.into());
    }
    tx.commit().await?;

    info!(question_id = %question.id, author_id = %question.author_id, "question submitted");
    Ok(QuestionDetails::new(&question, &answers))
}

/// Answers of a question in creation order, numbered from 1. Empty when the question has none.
pub async fn answers_for_question(
    state: &SharedState,
    question_id: Uuid,
) -> Result<Vec<AnswerSummary>, ServiceError> {
    let store = state.require_trivia_store().await?;
    let answers = store.answers_for_question(question_id).await?;
    Ok(answers.iter().map(AnswerSummary::from).collect())
}

fn validate_question(request: &CreateQuestionRequest) -> Result<(), ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::Validation(err.to_string()))?;

    if request.correct_answer > request.answers.len() {
        return Err(ServiceError::Validation(format!(
            "correct answer must be between 1 and {} (got {})",
            request.answers.len(),
            request.correct_answer
        )));
    }
    Ok(())
}

/// Build the question and its answers. The correct answer is linked from the question.
fn build_question(
    request: CreateQuestionRequest,
    now: SystemTime,
) -> (QuestionEntity, Vec<AnswerEntity>) {
    let question_id = Uuid::new_v4();
    let answers: Vec<AnswerEntity> = request
        .answers
        .into_iter()
        .enumerate()
        .map(|(position, text)| AnswerEntity {
            id: Uuid::new_v4(),
            question_id,
            position: position as u8,
            text: text.trim().to_owned(),
        })
        .collect();

    let correct_answer_id = answers
        .get(request.correct_answer - 1)
        .map(|answer| answer.id);

    let question = QuestionEntity {
        id: question_id,
        author_id: request.author_id,
        text: request.text.trim().to_owned(),
        correct_answer_id,
        created_at: now,
        activated_at: None,
    };

    (question, answers)
}
