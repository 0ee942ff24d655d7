use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerEntity, AnswerEntryEntity, QuestionEntity},
    dto::{
        format_system_time,
        validation::{validate_answer_texts, validate_not_blank},
    },
};

/// Payload submitted by a player proposing a new question.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateQuestionRequest {
    /// Internal identifier of the submitting user.
    pub author_id: Uuid,
    /// Question sentence, at most 128 characters.
    #[validate(length(min = 1, max = 128), custom(function = "validate_not_blank"))]
    pub text: String,
    /// Between two and four answers, each at most 32 characters.
    #[validate(length(min = 2, max = 4), custom(function = "validate_answer_texts"))]
    pub answers: Vec<String>,
    /// 1-based index of the correct entry in `answers`.
    #[validate(range(min = 1))]
    pub correct_answer: usize,
}

/// Answer submitted for the current round.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordAnswerRequest {
    /// Internal identifier of the answering user.
    pub user_id: Uuid,
    /// Question the user believes is current.
    pub question_id: Uuid,
    /// 1-based index of the chosen answer.
    pub answer: usize,
}

/// Public view of a question. The correct answer is never disclosed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: String,
    /// RFC 3339 activation time, absent while the question was never played.
    pub activated_at: Option<String>,
}

impl From<&QuestionEntity> for QuestionSummary {
    fn from(value: &QuestionEntity) -> Self {
        Self {
            id: value.id,
            author_id: value.author_id,
            text: value.text.clone(),
            created_at: format_system_time(value.created_at),
            activated_at: value.activated_at.map(format_system_time),
        }
    }
}

/// Answer as shown to players, numbered from 1.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerSummary {
    pub id: Uuid,
    /// Index players use to pick this answer.
    pub index: usize,
    pub text: String,
}

impl From<&AnswerEntity> for AnswerSummary {
    fn from(value: &AnswerEntity) -> Self {
        Self {
            id: value.id,
            index: usize::from(value.position) + 1,
            text: value.text.clone(),
        }
    }
}

/// Question together with its ordered answers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionDetails {
    pub question: QuestionSummary,
    pub answers: Vec<AnswerSummary>,
}

impl QuestionDetails {
    /// Build the view, numbering answers in creation order.
    pub fn new(question: &QuestionEntity, answers: &[AnswerEntity]) -> Self {
        let mut answers: Vec<&AnswerEntity> = answers.iter().collect();
        answers.sort_by_key(|answer| answer.position);
        Self {
            question: question.into(),
            answers: answers.into_iter().map(AnswerSummary::from).collect(),
        }
    }
}

/// Ledger row written by an answer submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerRecordedResponse {
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer_id: Uuid,
    /// 1-based index of the recorded choice.
    pub answer: usize,
    pub updated_at: String,
}

impl AnswerRecordedResponse {
    pub(crate) fn new(entry: &AnswerEntryEntity, answer: usize) -> Self {
        Self {
            entry_id: entry.id,
            user_id: entry.user_id,
            question_id: entry.question_id,
            answer_id: entry.answer_id,
            answer,
            updated_at: format_system_time(entry.updated_at),
        }
    }
}
