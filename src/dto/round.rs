use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    question::{QuestionDetails, QuestionSummary},
    user::UserSummary,
};

/// Result of a round rotation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RotationResponse {
    /// Round that was closed and scored, absent on the first rotation.
    pub closed_question_id: Option<Uuid>,
    /// Users credited with a point for the closed round.
    pub credited_users: u64,
    /// Question that is now current.
    pub question: QuestionSummary,
}

/// Snapshot rendered by the chat status command.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundStatusResponse {
    /// Current question and its answers, absent before the first rotation.
    pub current: Option<QuestionDetails>,
    /// Author of the current question, when still known.
    pub author: Option<UserSummary>,
    pub leaderboard: Vec<UserSummary>,
}
