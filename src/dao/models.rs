use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Trivia question persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// User who submitted the question.
    pub author_id: Uuid,
    /// Question sentence shown to players.
    pub text: String,
    /// Identifier of the answer that scores a point, once answers exist.
    pub correct_answer_id: Option<Uuid>,
    /// Submission timestamp.
    pub created_at: SystemTime,
    /// When the question became the current round; `None` while dormant.
    pub activated_at: Option<SystemTime>,
}

/// Candidate answer owned by a single question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Primary key of the answer.
    pub id: Uuid,
    /// Owning question.
    pub question_id: Uuid,
    /// Zero-based creation order within the question.
    pub position: u8,
    /// Answer sentence.
    pub text: String,
}

/// Ledger row recording the choice a user made for a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntryEntity {
    /// Primary key of the entry, stable across overwrites.
    pub id: Uuid,
    /// User who answered.
    pub user_id: Uuid,
    /// Question the answer belongs to.
    pub question_id: Uuid,
    /// Chosen answer.
    pub answer_id: Uuid,
    /// Last time the user changed their choice.
    pub updated_at: SystemTime,
}

/// Player known to the trivia backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user.
    pub id: Uuid,
    /// Identifier in the chat platform directory.
    pub external_id: String,
    /// Name displayed on the leaderboard.
    pub display_name: String,
    /// Optional avatar URL.
    pub image_url: Option<String>,
    /// Accumulated score, only ever increased by round scoring.
    pub points: u64,
    /// Creation timestamp.
    pub created_at: SystemTime,
}
