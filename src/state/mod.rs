pub mod round;

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{config::AppConfig, dao::trivia_store::TriviaStore, error::ServiceError};

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and round rotation guards.
pub struct AppState {
    trivia_store: RwLock<Option<Arc<dyn TriviaStore>>>,
    degraded: watch::Sender<bool>,
    rotation_gate: Mutex<()>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            trivia_store: RwLock::new(None),
            degraded: degraded_tx,
            rotation_gate: Mutex::new(()),
            config,
        })
    }

    /// Obtain a handle to the current trivia store, if one is installed.
    pub async fn trivia_store(&self) -> Option<Arc<dyn TriviaStore>> {
        let guard = self.trivia_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current trivia store, or [`ServiceError::Degraded`] while storage is missing or unhealthy.
    pub async fn require_trivia_store(&self) -> Result<Arc<dyn TriviaStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        self.trivia_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new trivia store implementation and leave degraded mode.
    pub async fn install_trivia_store(&self, store: Arc<dyn TriviaStore>) {
        {
            let mut guard = self.trivia_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current trivia store and enter degraded mode.
    pub async fn clear_trivia_store(&self) {
        {
            let mut guard = self.trivia_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run `work` as the only rotation in flight, bounded by the configured rotation timeout.
    ///
    /// On timeout the work future is dropped, which rolls back any open transaction.
    pub async fn run_rotation<F, Fut, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let _gate = self.rotation_gate.lock().await;
        let work_future = work();
        match self.config.rotation_timeout() {
            Some(limit) => match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "round rotation timed out; rolled back"
                    );
                    Err(ServiceError::Timeout)
                }
            },
            None => work_future.await,
        }
    }

    /// Delay between scheduled rotations.
    pub fn rotation_interval(&self) -> Duration {
        self.config.rotation_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::trivia_store::memory::MemoryTriviaStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_trivia_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state
            .install_trivia_store(Arc::new(MemoryTriviaStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_trivia_store().await.is_ok());

        state.update_degraded(true);
        assert!(matches!(
            state.require_trivia_store().await,
            Err(ServiceError::Degraded)
        ));

        state.clear_trivia_store().await;
        assert!(state.trivia_store().await.is_none());
    }

    #[tokio::test]
    async fn rotation_timeout_is_reported() {
        let config = AppConfig::default().with_rotation_timeout(Some(Duration::from_millis(10)));
        let state = AppState::new(config);
        let result: Result<(), _> = state
            .run_rotation(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Timeout)));
    }
}
