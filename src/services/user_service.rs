use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::UserEntity,
    dto::user::{RegisterUserRequest, UserSummary},
    error::ServiceError,
    state::SharedState,
};

/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

/// Create the user, or refresh the profile of the user sharing the same external id.
///
/// Points and the internal id of an existing user are kept.
pub async fn register_user(
    state: &SharedState,
    request: RegisterUserRequest,
) -> Result<UserSummary, ServiceError> {
    let store = state.require_trivia_store().await?;

    let RegisterUserRequest {
        external_id,
        display_name,
        image_url,
    } = request;
    let user = UserEntity {
        id: Uuid::new_v4(),
        external_id: external_id.trim().to_owned(),
        display_name: display_name.trim().to_owned(),
        image_url,
        points: 0,
        created_at: SystemTime::now(),
    };

    let stored = store.upsert_user(user).await?;
    debug!(user_id = %stored.id, external_id = %stored.external_id, "user registered");
    Ok(stored.into())
}

/// Fetch a single user by internal id.
pub async fn get_user(state: &SharedState, id: Uuid) -> Result<UserSummary, ServiceError> {
    let store = state.require_trivia_store().await?;
    store
        .find_user(id)
        .await?
        .map(UserSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("user `{id}` not found")))
}

/// Users with the most points, ties broken by display name.
///
/// `count` defaults to the configured leaderboard size.
pub async fn get_users_top(
    state: &SharedState,
    count: Option<usize>,
) -> Result<Vec<UserSummary>, ServiceError> {
    let count = count
        .unwrap_or_else(|| state.config().leaderboard_size().min(MAX_LEADERBOARD_SIZE));
    if !(1..=MAX_LEADERBOARD_SIZE).contains(&count) {
        return Err(ServiceError::Validation(format!(
            "count must be between 1 and {MAX_LEADERBOARD_SIZE} (got {count})"
        )));
    }

    let store = state.require_trivia_store().await?;
    let users = store.top_users(count).await?;
    Ok(users.into_iter().map(UserSummary::from).collect())
}
