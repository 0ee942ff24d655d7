//! Round rotation: close and score the current round, then activate a random dormant question.
//!
//! Every rotation is a single storage transaction. Any failure rolls the whole thing back, so
//! the previous round stays current and no points move.

use std::time::SystemTime;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::{
    dao::{
        models::QuestionEntity,
        trivia_store::{TriviaStore, TriviaTransaction},
    },
    dto::{question::QuestionSummary, round::RotationResponse},
    error::ServiceError,
    services::scoring,
    state::{
        SharedState,
        round::{self, RotationPlan},
    },
};

/// What a committed rotation changed.
#[derive(Debug, Clone)]
pub struct RotationOutcome {
    /// Round that was closed and scored.
    pub closed: Option<QuestionEntity>,
    /// Users credited for the closed round.
    pub credited: u64,
    /// Question that is now current, with its activation timestamp set.
    pub activated: QuestionEntity,
}

impl From<RotationOutcome> for RotationResponse {
    fn from(value: RotationOutcome) -> Self {
        Self {
            closed_question_id: value.closed.map(|question| question.id),
            credited_users: value.credited,
            question: QuestionSummary::from(&value.activated),
        }
    }
}

/// Rotate the round now, serialized with any other rotation and bounded by the rotation timeout.
pub async fn rotate(state: &SharedState) -> Result<RotationResponse, ServiceError> {
    let store = state.require_trivia_store().await?;
    let outcome = state
        .run_rotation(|| rotate_with(store.as_ref(), SystemTime::now()))
        .await?;
    Ok(outcome.into())
}

/// Run one rotation against `store`, activating the chosen question at `now` or just after the
/// closing round's activation, whichever is later.
pub async fn rotate_with(
    store: &dyn TriviaStore,
    now: SystemTime,
) -> Result<RotationOutcome, ServiceError> {
    let mut tx = store.begin().await?;
    match rotate_in(tx.as_mut(), now).await {
        Ok(outcome) => {
            tx.commit().await?;
            Ok(outcome)
        }
        Err(err) => {
            if let Err(abort_err) = tx.abort().await {
                warn!(error = %abort_err, "failed to abort round rotation");
            }
            Err(err)
        }
    }
}

async fn rotate_in(
    tx: &mut dyn TriviaTransaction,
    now: SystemTime,
) -> Result<RotationOutcome, ServiceError> {
    let closing = tx.current_question().await?;
    let credited = match closing.as_ref() {
        Some(question) => scoring::score_round(tx, question).await?,
        None => 0,
    };

    let dormant = tx.dormant_questions().await?;
    let next = {
        let mut rng = rand::rng();
        round::select_next(&dormant, &mut rng).cloned()
    }
    .ok_or(ServiceError::NoQuestionAvailable)?;

    let RotationPlan {
        closing,
        mut next,
        activated_at,
    } = RotationPlan::new(closing, next, now)?;
    tx.activate_question(next.id, activated_at).await?;
    next.activated_at = Some(activated_at);

    Ok(RotationOutcome {
        closed: closing,
        credited,
        activated: next,
    })
}

/// Rotate on a fixed interval until the task is dropped. The first rotation happens one
/// interval after start-up.
pub async fn run_rotator(state: SharedState) {
    let period = state.rotation_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = period.as_secs(), "round rotator started");

    loop {
        ticker.tick().await;

        if state.is_degraded() {
            debug!("storage degraded; skipping round rotation");
            continue;
        }

        match rotate(&state).await {
            Ok(rotation) => info!(
                question_id = %rotation.question.id,
                closed_question_id = ?rotation.closed_question_id,
                credited_users = rotation.credited_users,
                "round rotated"
            ),
            Err(ServiceError::NoQuestionAvailable) => {
                warn!("no dormant question available; keeping the current round")
            }
            Err(ServiceError::Degraded) => debug!("storage degraded; skipping round rotation"),
            Err(err) => error!(error = %err, "round rotation failed; retrying on next tick"),
        }
    }
}
