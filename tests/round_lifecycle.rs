//! End-to-end round lifecycle against the in-memory store.

use std::{collections::HashSet, sync::Arc};

use trivia_back::{
    config::AppConfig,
    dao::trivia_store::memory::MemoryTriviaStore,
    dto::{
        question::{CreateQuestionRequest, QuestionSummary, RecordAnswerRequest},
        user::RegisterUserRequest,
    },
    error::ServiceError,
    services::{ledger_service, question_service, rotation_service, round_service, user_service},
    state::{AppState, SharedState},
};
use uuid::Uuid;

async fn memory_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .install_trivia_store(Arc::new(MemoryTriviaStore::new()))
        .await;
    state
}

async fn register(state: &SharedState, name: &str) -> Uuid {
    user_service::register_user(
        state,
        RegisterUserRequest {
            external_id: format!("chat-{name}"),
            display_name: name.into(),
            image_url: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn create(
    state: &SharedState,
    author_id: Uuid,
    text: &str,
    answers: &[&str],
    correct_answer: usize,
) -> QuestionSummary {
    question_service::create_question(
        state,
        CreateQuestionRequest {
            author_id,
            text: text.into(),
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            correct_answer,
        },
    )
    .await
    .unwrap()
    .question
}

async fn answer(
    state: &SharedState,
    user_id: Uuid,
    question_id: Uuid,
    answer: usize,
) -> Result<(), ServiceError> {
    ledger_service::record_answer(
        state,
        RecordAnswerRequest {
            user_id,
            question_id,
            answer,
        },
    )
    .await
    .map(|_| ())
}

async fn points(state: &SharedState, user_id: Uuid) -> u64 {
    user_service::get_user(state, user_id).await.unwrap().points
}

#[tokio::test]
async fn correct_answer_scores_when_round_closes() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;

    let q1 = create(&state, alice, "Is the sky blue?", &["Yes", "No"], 1).await;
    let first = rotation_service::rotate(&state).await.unwrap();
    assert_eq!(first.question.id, q1.id);

    answer(&state, alice, q1.id, 1).await.unwrap();
    assert_eq!(points(&state, alice).await, 0);

    let q2 = create(&state, alice, "Is grass red?", &["Yes", "No"], 2).await;
    let second = rotation_service::rotate(&state).await.unwrap();
    assert_eq!(second.closed_question_id, Some(q1.id));
    assert_eq!(second.question.id, q2.id);
    assert_eq!(points(&state, alice).await, 1);

    let current = round_service::current_question(&state).await.unwrap();
    assert_eq!(current.question.id, q2.id);
}

#[tokio::test]
async fn closed_round_is_scored_exactly_once() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;

    let q1 = create(&state, alice, "One?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();
    answer(&state, alice, q1.id, 1).await.unwrap();

    create(&state, alice, "Two?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();
    create(&state, alice, "Three?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();

    assert_eq!(points(&state, alice).await, 1);
    assert!(matches!(
        answer(&state, alice, q1.id, 1).await,
        Err(ServiceError::NoActiveRound)
    ));
}

#[tokio::test]
async fn out_of_range_answer_reports_count() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let q1 = create(&state, alice, "Binary?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();

    let err = answer(&state, alice, q1.id, 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidAnswerIndex { count: 2 }));
    assert_eq!(err.to_string(), "invalid answer index: there are 2 possible answers");
}

#[tokio::test]
async fn re_answering_keeps_only_latest_choice() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let q1 = create(&state, alice, "Change your mind?", &["Yes", "No", "Maybe"], 3).await;
    rotation_service::rotate(&state).await.unwrap();

    answer(&state, alice, q1.id, 1).await.unwrap();
    answer(&state, alice, q1.id, 3).await.unwrap();
    answer(&state, bob, q1.id, 3).await.unwrap();
    answer(&state, bob, q1.id, 2).await.unwrap();

    create(&state, alice, "Next?", &["Yes", "No"], 1).await;
    let rotation = rotation_service::rotate(&state).await.unwrap();
    assert_eq!(rotation.credited_users, 1);
    assert_eq!(points(&state, alice).await, 1);
    assert_eq!(points(&state, bob).await, 0);
}

#[tokio::test]
async fn every_question_is_activated_once() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let mut submitted = HashSet::new();
    for index in 0..5 {
        let question = create(&state, alice, &format!("Question {index}?"), &["a", "b"], 1).await;
        submitted.insert(question.id);
    }

    let mut activated = HashSet::new();
    let mut last = None;
    for _ in 0..5 {
        let rotation = rotation_service::rotate(&state).await.unwrap();
        assert_eq!(rotation.closed_question_id, last);
        assert!(activated.insert(rotation.question.id));
        last = Some(rotation.question.id);
    }
    assert_eq!(activated, submitted);

    assert!(matches!(
        rotation_service::rotate(&state).await,
        Err(ServiceError::NoQuestionAvailable)
    ));
    let current = round_service::current_question(&state).await.unwrap();
    assert_eq!(Some(current.question.id), last);
}

#[tokio::test]
async fn failed_rotation_rolls_back_scoring() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let q1 = create(&state, alice, "Only one?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();
    answer(&state, alice, q1.id, 1).await.unwrap();

    assert!(matches!(
        rotation_service::rotate(&state).await,
        Err(ServiceError::NoQuestionAvailable)
    ));
    assert_eq!(points(&state, alice).await, 0);

    // The round is still open and is scored once a new question arrives.
    create(&state, alice, "Second?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();
    assert_eq!(points(&state, alice).await, 1);
}

#[tokio::test]
async fn status_lists_leaderboard_by_points() {
    let state = memory_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let q1 = create(&state, alice, "Status?", &["Yes", "No"], 2).await;
    rotation_service::rotate(&state).await.unwrap();
    answer(&state, bob, q1.id, 2).await.unwrap();
    create(&state, bob, "Again?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();

    let status = round_service::round_status(&state).await.unwrap();
    let names: Vec<String> = status
        .leaderboard
        .into_iter()
        .map(|user| user.display_name)
        .collect();
    assert_eq!(names, vec!["bob".to_string(), "alice".to_string()]);
    assert_eq!(status.author.map(|user| user.id), Some(bob));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn answers_racing_rotation_are_never_double_counted() {
    let state = memory_state().await;
    let author = register(&state, "author").await;
    let mut players = Vec::new();
    for index in 0..24 {
        players.push(register(&state, &format!("player{index:02}")).await);
    }

    let q1 = create(&state, author, "Race?", &["Yes", "No"], 1).await;
    rotation_service::rotate(&state).await.unwrap();
    create(&state, author, "After the race?", &["Yes", "No"], 1).await;

    let mut handles = Vec::new();
    for player in players.iter().copied() {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                match answer(&state, player, q1.id, 1).await {
                    Ok(()) | Err(ServiceError::NoActiveRound) => {}
                    Err(err) => panic!("unexpected error: {err}"),
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    let rotator = {
        let state = state.clone();
        tokio::spawn(async move { rotation_service::rotate(&state).await })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    let rotation = rotator.await.unwrap().unwrap();
    assert_eq!(rotation.closed_question_id, Some(q1.id));

    let mut total = 0;
    for player in &players {
        let score = points(&state, *player).await;
        assert!(score <= 1, "player scored {score} points for one round");
        total += score;
    }
    assert_eq!(total, rotation.credited_users);
    assert!(total as usize <= players.len());
}
