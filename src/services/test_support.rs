use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::trivia_store::memory::MemoryTriviaStore,
    dto::{
        question::{CreateQuestionRequest, QuestionDetails},
        user::RegisterUserRequest,
    },
    services::{question_service, user_service},
    state::{AppState, SharedState},
};

pub async fn memory_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .install_trivia_store(Arc::new(MemoryTriviaStore::new()))
        .await;
    state
}

pub async fn register(state: &SharedState, name: &str) -> Uuid {
    user_service::register_user(
        state,
        RegisterUserRequest {
            external_id: format!("ext-{name}"),
            display_name: name.into(),
            image_url: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn submit(
    state: &SharedState,
    author_id: Uuid,
    answers: &[&str],
    correct_answer: usize,
) -> QuestionDetails {
    question_service::create_question(
        state,
        CreateQuestionRequest {
            author_id,
            text: format!("Which one of {}?", answers.join(", ")),
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            correct_answer,
        },
    )
    .await
    .unwrap()
}
