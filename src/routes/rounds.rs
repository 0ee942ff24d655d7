use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::round::{RotationResponse, RoundStatusResponse},
    error::AppError,
    services::{rotation_service, round_service},
    state::SharedState,
};

/// Round status and operator rotation endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/status", get(round_status))
        .route("/rounds/rotate", post(rotate_round))
}

/// Current round, its author, and the leaderboard.
#[utoipa::path(
    get,
    path = "/status",
    tag = "rounds",
    responses((status = 200, description = "Round status", body = RoundStatusResponse))
)]
pub async fn round_status(
    State(state): State<SharedState>,
) -> Result<Json<RoundStatusResponse>, AppError> {
    Ok(Json(round_service::round_status(&state).await?))
}

/// Close and score the current round immediately and activate the next question.
#[utoipa::path(
    post,
    path = "/rounds/rotate",
    tag = "rounds",
    responses(
        (status = 200, description = "Round rotated", body = RotationResponse),
        (status = 409, description = "No dormant question available"),
        (status = 503, description = "Storage unavailable or rotation timed out")
    )
)]
pub async fn rotate_round(
    State(state): State<SharedState>,
) -> Result<Json<RotationResponse>, AppError> {
    Ok(Json(rotation_service::rotate(&state).await?))
}
