use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::user::{RegisterUserRequest, TopUsersQuery, UserSummary},
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Player registration and leaderboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users", put(register_user))
        .route("/users/top", get(top_users))
        .route("/users/{id}", get(get_user))
}

/// Create a player or refresh the profile of an existing one, keeping their points.
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "User stored", body = UserSummary),
        (status = 400, description = "Invalid profile")
    )
)]
pub async fn register_user(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterUserRequest>>,
) -> Result<Json<UserSummary>, AppError> {
    Ok(Json(user_service::register_user(&state, payload).await?))
}

/// Leaderboard ordered by points, ties broken by display name.
#[utoipa::path(
    get,
    path = "/users/top",
    tag = "users",
    params(TopUsersQuery),
    responses((status = 200, description = "Top users", body = [UserSummary]))
)]
pub async fn top_users(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<TopUsersQuery>>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(user_service::get_users_top(&state, query.count).await?))
}

/// Retrieve a player by internal identifier.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "Identifier of the user")),
    responses(
        (status = 200, description = "User", body = UserSummary),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserSummary>, AppError> {
    Ok(Json(user_service::get_user(&state, id).await?))
}
