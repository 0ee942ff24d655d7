//! Application-level configuration loading: round rotation cadence and leaderboard sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";
const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(600);
const DEFAULT_ROTATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Number of players shown by the chat status view.
const DEFAULT_LEADERBOARD_SIZE: usize = 6;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rotation_interval: Duration,
    rotation_timeout: Option<Duration>,
    leaderboard_size: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rotation_interval_secs = app_config.rotation_interval.as_secs(),
                        leaderboard_size = app_config.leaderboard_size,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Delay between two scheduled round rotations.
    pub fn rotation_interval(&self) -> Duration {
        self.rotation_interval
    }

    /// Upper bound for a single rotation; `None` disables the limit.
    pub fn rotation_timeout(&self) -> Option<Duration> {
        self.rotation_timeout
    }

    /// Leaderboard length used when the caller does not ask for a specific count.
    pub fn leaderboard_size(&self) -> usize {
        self.leaderboard_size
    }

    /// Override the rotation cadence.
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    /// Override the rotation timeout.
    pub fn with_rotation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.rotation_timeout = timeout;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            rotation_timeout: Some(DEFAULT_ROTATION_TIMEOUT),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rotation_interval_secs: Option<u64>,
    /// `0` disables the rotation timeout.
    rotation_timeout_secs: Option<u64>,
    leaderboard_size: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            rotation_interval: value
                .rotation_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.rotation_interval),
            rotation_timeout: match value.rotation_timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.rotation_timeout,
            },
            leaderboard_size: value
                .leaderboard_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.leaderboard_size),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rotation_interval(), DEFAULT_ROTATION_INTERVAL);
        assert_eq!(config.rotation_timeout(), Some(DEFAULT_ROTATION_TIMEOUT));
        assert_eq!(config.leaderboard_size(), DEFAULT_LEADERBOARD_SIZE);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"rotation_interval_secs": 30, "rotation_timeout_secs": 0, "leaderboard_size": 10}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rotation_interval(), Duration::from_secs(30));
        assert_eq!(config.rotation_timeout(), None);
        assert_eq!(config.leaderboard_size(), 10);
    }

    #[test]
    fn zero_interval_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{"rotation_interval_secs": 0}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rotation_interval(), DEFAULT_ROTATION_INTERVAL);
    }
}
