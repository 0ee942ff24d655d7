use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_trivia_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::memory_state;

    #[tokio::test]
    async fn reports_ok_with_store_and_degraded_without() {
        let state = memory_state().await;
        assert_eq!(health_status(&state).await.status, "ok");

        state.clear_trivia_store().await;
        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
