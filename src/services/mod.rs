/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Answer ledger: records the choice each user made for the current round.
pub mod ledger_service;
/// Question submission and answer listing.
pub mod question_service;
/// Round rotation unit of work and the scheduler driving it.
pub mod rotation_service;
/// Read-only views of the current round.
pub mod round_service;
/// Point awards for a closing round.
pub mod scoring;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// User registration, lookup and leaderboard.
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support;
