use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::question::{
        AnswerRecordedResponse, AnswerSummary, CreateQuestionRequest, QuestionDetails,
        RecordAnswerRequest,
    },
    error::AppError,
    services::{ledger_service, question_service, round_service},
    state::SharedState,
};

/// Question submission, current round, and answer ledger endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/questions", post(create_question))
        .route("/questions/current", get(current_question))
        .route("/questions/current/answers", post(record_answer))
        .route("/questions/{id}/answers", get(question_answers))
}

/// Submit a new question. It stays dormant until the rotator picks it.
#[utoipa::path(
    post,
    path = "/questions",
    tag = "questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question stored", body = QuestionDetails),
        (status = 400, description = "Invalid question or answers"),
        (status = 404, description = "Unknown author")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionDetails>), AppError> {
    let details = question_service::create_question(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Retrieve the question of the running round with its answers.
#[utoipa::path(
    get,
    path = "/questions/current",
    tag = "questions",
    responses(
        (status = 200, description = "Current question", body = QuestionDetails),
        (status = 404, description = "No question was activated yet")
    )
)]
pub async fn current_question(
    State(state): State<SharedState>,
) -> Result<Json<QuestionDetails>, AppError> {
    Ok(Json(round_service::current_question(&state).await?))
}

/// List the answers of a question in the order players pick them.
#[utoipa::path(
    get,
    path = "/questions/{id}/answers",
    tag = "questions",
    params(("id" = String, Path, description = "Identifier of the question")),
    responses((status = 200, description = "Answers of the question", body = [AnswerSummary]))
)]
pub async fn question_answers(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AnswerSummary>>, AppError> {
    Ok(Json(question_service::answers_for_question(&state, id).await?))
}

/// Record or change a user's answer for the current round.
#[utoipa::path(
    post,
    path = "/questions/current/answers",
    tag = "questions",
    request_body = RecordAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = AnswerRecordedResponse),
        (status = 400, description = "Answer index out of range"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Question is not the current round")
    )
)]
pub async fn record_answer(
    State(state): State<SharedState>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<Json<AnswerRecordedResponse>, AppError> {
    Ok(Json(ledger_service::record_answer(&state, payload).await?))
}
