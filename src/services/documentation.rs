use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::questions::create_question,
        crate::routes::questions::current_question,
        crate::routes::questions::question_answers,
        crate::routes::questions::record_answer,
        crate::routes::rounds::round_status,
        crate::routes::rounds::rotate_round,
        crate::routes::users::register_user,
        crate::routes::users::top_users,
        crate::routes::users::get_user,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::question::CreateQuestionRequest,
            crate::dto::question::RecordAnswerRequest,
            crate::dto::question::QuestionSummary,
            crate::dto::question::AnswerSummary,
            crate::dto::question::QuestionDetails,
            crate::dto::question::AnswerRecordedResponse,
            crate::dto::round::RotationResponse,
            crate::dto::round::RoundStatusResponse,
            crate::dto::user::RegisterUserRequest,
            crate::dto::user::UserSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "questions", description = "Question submission and the answer ledger"),
        (name = "rounds", description = "Round status and rotation"),
        (name = "users", description = "Player registration and leaderboard"),
    )
)]
pub struct ApiDoc;
