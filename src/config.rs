//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    services::coordination::RetryPolicy,
    state::{
        host::{FadeSession, RevealSettings},
        reveal::FadeBackground,
    },
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PHOTO_BUZZ_CONFIG_PATH";
/// Environment variable that overrides the round document location.
const STATE_PATH_ENV: &str = "PHOTO_BUZZ_STATE_PATH";

/// Backend holding the round document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// JSON file shared with other processes.
    #[default]
    File,
    /// In-process document, lost on exit.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum RawBackground {
    #[default]
    White,
    Black,
}

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Location of the shared round document.
    pub state_path: PathBuf,
    /// Round document backend.
    pub store: StoreKind,
    /// Directory holding the photo deck.
    pub photos_dir: PathBuf,
    /// Retry rules for store reads and writes.
    pub retry: RetryPolicy,
    /// Cadence of team polling (team console).
    pub team_poll_interval: Duration,
    /// Cadence of the host poll cycle.
    pub host_poll_interval: Duration,
    /// Initial grid reveal settings.
    pub reveal: RevealSettings,
    /// Initial fade increment.
    pub fade_step: f32,
    /// Delay between two fade ticks.
    pub fade_tick: Duration,
    /// Initial fade background.
    pub fade_background: FadeBackground,
    /// Serialise buzz check and claim inside this process.
    pub strict_buzz_lock: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration");
                    raw.into()
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
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(path) = env::var_os(STATE_PATH_ENV).filter(|value| !value.is_empty()) {
            self.state_path = PathBuf::from(path);
        }
        self
    }

    /// Fresh fade session using the configured step and background.
    pub fn fade_session(&self) -> FadeSession {
        FadeSession::new(self.fade_step, self.fade_background)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    state_path: PathBuf,
    store: StoreKind,
    photos_dir: PathBuf,
    read_attempts: u32,
    retry_backoff_ms: u64,
    team_poll_interval_ms: u64,
    host_poll_interval_ms: u64,
    grid_size: usize,
    reveal_delay_secs: f64,
    fade_step: f32,
    fade_tick_ms: u64,
    fade_background: RawBackground,
    strict_buzz_lock: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("quiz_state.json"),
            store: StoreKind::File,
            photos_dir: PathBuf::from("photos"),
            read_attempts: 5,
            retry_backoff_ms: 50,
            team_poll_interval_ms: 1_000,
            host_poll_interval_ms: 1_000,
            grid_size: 10,
            reveal_delay_secs: 0.3,
            fade_step: 0.02,
            fade_tick_ms: 50,
            fade_background: RawBackground::White,
            strict_buzz_lock: false,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let reveal_delay = Duration::try_from_secs_f64(value.reveal_delay_secs)
            .unwrap_or(Duration::from_millis(300));
        Self {
            state_path: value.state_path,
            store: value.store,
            photos_dir: value.photos_dir,
            retry: RetryPolicy::new(
                value.read_attempts,
                Duration::from_millis(value.retry_backoff_ms),
            ),
            team_poll_interval: Duration::from_millis(value.team_poll_interval_ms.max(1)),
            host_poll_interval: Duration::from_millis(value.host_poll_interval_ms.max(1)),
            reveal: RevealSettings::clamped(value.grid_size, reveal_delay),
            fade_step: value.fade_step,
            fade_tick: Duration::from_millis(value.fade_tick_ms.max(1)),
            fade_background: match value.fade_background {
                RawBackground::White => FadeBackground::White,
                RawBackground::Black => FadeBackground::Black,
            },
            strict_buzz_lock: value.strict_buzz_lock,
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
