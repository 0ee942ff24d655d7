use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, trivia_store::TriviaStore},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TriviaStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::default();

    loop {
        match connect().await {
            Ok(store) => {
                state.install_trivia_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                backoff = Backoff::default();

                watch_store(&state, store.as_ref()).await;
                warn!("exhausted storage reconnect attempts; dropping the store and reconnecting from scratch");
                state.clear_trivia_store().await;
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }
        backoff.wait().await;
    }
}

/// Poll the installed store until it fails and cannot be revived in place.
async fn watch_store(state: &SharedState, store: &dyn TriviaStore) {
    loop {
        if store.health_check().await.is_err() && !revive(state, store).await {
            return;
        }
        if state.is_degraded() {
            info!("storage healthy again; leaving degraded mode");
            state.update_degraded(false);
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Reconnect the existing store with bounded attempts. The first failure switches to degraded mode.
async fn revive(state: &SharedState, store: &dyn TriviaStore) -> bool {
    let mut backoff = Backoff::default();
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) if attempt == 0 => {
                warn!(attempt, error = %err, "storage reconnect first attempt failed; entering degraded mode");
                state.update_degraded(true);
            }
            Err(err) => warn!(attempt, error = %err, "storage reconnect attempt failed"),
        }
        backoff.wait().await;
    }
    false
}

/// Doubling delay between attempts, capped at [`MAX_DELAY`].
struct Backoff {
    delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            delay: INITIAL_DELAY,
        }
    }
}

impl Backoff {
    async fn wait(&mut self) {
        sleep(self.delay).await;
        self.delay = (self.delay * 2).min(MAX_DELAY);
    }
}
