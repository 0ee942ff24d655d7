use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::{format_system_time, validation::validate_not_blank},
};

/// Profile pushed by the chat integration after resolving a player in its directory.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct RegisterUserRequest {
    /// Identifier of the player in the chat platform.
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub external_id: String,
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub display_name: String,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Query string accepted by the leaderboard route.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TopUsersQuery {
    /// Number of users to return (1 to 100). Defaults to the configured leaderboard size.
    #[validate(range(min = 1, max = 100))]
    pub count: Option<usize>,
}

/// Player profile and score.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub external_id: String,
    pub display_name: String,
    pub image_url: Option<String>,
    pub points: u64,
    pub created_at: String,
}

impl From<UserEntity> for UserSummary {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            external_id: value.external_id,
            display_name: value.display_name,
            image_url: value.image_url,
            points: value.points,
            created_at: format_system_time(value.created_at),
        }
    }
}
