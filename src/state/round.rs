//! Round lifecycle of a single question and the rules used to pick the next round.
//!
//! A question starts `Dormant`, becomes `Active` when the rotator stamps its activation time,
//! and is `Closed` as soon as a newer question is activated. Transitions never go backwards.

use std::time::{Duration, SystemTime};

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::QuestionEntity;

/// Smallest gap kept between two activation timestamps; storage may truncate to milliseconds.
const MIN_ACTIVATION_GAP: Duration = Duration::from_millis(1);

/// Phase a question is in relative to the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Never activated.
    Dormant,
    /// Activated most recently; this is the current question.
    Active,
    /// Activated in the past and superseded by a newer question.
    Closed,
}

/// Events the rotator applies to questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Make a dormant question the current round.
    Activate,
    /// Retire the current round because another question is being activated.
    Close,
}

/// Error returned when a question cannot take the requested lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied to question {question_id} while {from:?}")]
pub struct InvalidTransition {
    /// Question the event targeted.
    pub question_id: Uuid,
    /// Phase the question was in.
    pub from: RoundPhase,
    /// Rejected event.
    pub event: RoundEvent,
}

impl RoundPhase {
    /// Derive the phase of `question` given the current question, if any.
    pub fn of(question: &QuestionEntity, current: Option<&QuestionEntity>) -> Self {
        match (question.activated_at, current) {
            (None, _) => RoundPhase::Dormant,
            (Some(_), Some(current)) if current.id == question.id => RoundPhase::Active,
            (Some(_), _) => RoundPhase::Closed,
        }
    }

    /// Compute the phase reached by applying `event`, if the lifecycle allows it.
    pub fn apply(self, event: RoundEvent) -> Option<RoundPhase> {
        match (self, event) {
            (RoundPhase::Dormant, RoundEvent::Activate) => Some(RoundPhase::Active),
            (RoundPhase::Active, RoundEvent::Close) => Some(RoundPhase::Closed),
            _ => None,
        }
    }
}

/// Validated rotation: which round closes, which opens, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// Current round that will be scored and closed, absent on the very first rotation.
    pub closing: Option<QuestionEntity>,
    /// Dormant question that becomes current.
    pub next: QuestionEntity,
    /// Activation timestamp for `next`, strictly after the closing round's.
    pub activated_at: SystemTime,
}

impl RotationPlan {
    /// Check both lifecycle steps and fix the activation timestamp.
    pub fn new(
        closing: Option<QuestionEntity>,
        next: QuestionEntity,
        now: SystemTime,
    ) -> Result<Self, InvalidTransition> {
        if let Some(closing) = closing.as_ref() {
            step(closing, Some(closing), RoundEvent::Close)?;
        }
        step(&next, closing.as_ref(), RoundEvent::Activate)?;

        let activated_at = activation_time(now, closing.as_ref().and_then(|q| q.activated_at));
        Ok(Self {
            closing,
            next,
            activated_at,
        })
    }
}

fn step(
    question: &QuestionEntity,
    current: Option<&QuestionEntity>,
    event: RoundEvent,
) -> Result<RoundPhase, InvalidTransition> {
    let from = RoundPhase::of(question, current);
    from.apply(event).ok_or(InvalidTransition {
        question_id: question.id,
        from,
        event,
    })
}

/// Pick the next round uniformly among `dormant`.
pub fn select_next<'a, R>(dormant: &'a [QuestionEntity], rng: &mut R) -> Option<&'a QuestionEntity>
where
    R: Rng + ?Sized,
{
    if dormant.is_empty() {
        return None;
    }
    dormant.get(rng.random_range(0..dormant.len()))
}

/// Wall-clock activation time, pushed past `previous` so the newest round always sorts last.
pub fn activation_time(now: SystemTime, previous: Option<SystemTime>) -> SystemTime {
    match previous {
        Some(previous) if now < previous + MIN_ACTIVATION_GAP => previous + MIN_ACTIVATION_GAP,
        _ => now,
    }
}
