pub mod host;
pub mod reveal;
pub mod round;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::round_store::RoundStore,
    error::ServiceError,
    photo::PhotoDeck,
    services::{
        buzzer::BuzzerArbiter, coordination::CoordinationStore, display::BroadcastDisplay,
    },
    state::host::HostSession,
};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the display event channel.
const DISPLAY_EVENT_CAPACITY: usize = 16;

/// Central application state: the round store handle, the host session and
/// the display.
pub struct AppState {
    config: AppConfig,
    round_store: RwLock<Option<Arc<dyn RoundStore>>>,
    degraded: watch::Sender<bool>,
    host: Mutex<HostSession>,
    host_wakeup: Notify,
    buzz_gate: Arc<Mutex<()>>,
    display: Arc<BroadcastDisplay>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a round store is installed.
    pub fn new(config: AppConfig, deck: PhotoDeck) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let host = HostSession::new(deck, config.reveal, config.fade_session());
        Arc::new(Self {
            config,
            round_store: RwLock::new(None),
            degraded: degraded_tx,
            host: Mutex::new(host),
            host_wakeup: Notify::new(),
            buzz_gate: Arc::new(Mutex::new(())),
            display: Arc::new(BroadcastDisplay::new(DISPLAY_EVENT_CAPACITY)),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current round store, if one is installed.
    pub async fn round_store(&self) -> Option<Arc<dyn RoundStore>> {
        let guard = self.round_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new round store implementation and leave degraded mode.
    pub async fn install_round_store(&self, store: Arc<dyn RoundStore>) {
        {
            let mut guard = self.round_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if changed {
            self.display.announce_status(value);
        }
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Coordination handle over the installed store.
    ///
    /// Fails while no store is installed or while the store is unhealthy.
    pub async fn coordination(&self) -> Result<CoordinationStore, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let store = self.round_store().await.ok_or(ServiceError::Degraded)?;
        Ok(CoordinationStore::new(store, self.config.retry))
    }

    /// Buzz arbiter over the installed store, gated when the strict lock is enabled.
    pub async fn buzzer(&self) -> Result<BuzzerArbiter, ServiceError> {
        let store = self.coordination().await?;
        Ok(if self.config.strict_buzz_lock {
            BuzzerArbiter::with_gate(store, self.buzz_gate.clone())
        } else {
            BuzzerArbiter::new(store)
        })
    }

    /// Host presentation state.
    pub fn host(&self) -> &Mutex<HostSession> {
        &self.host
    }

    /// Wake the host poll cycle ahead of its next tick.
    pub fn wake_host(&self) {
        self.host_wakeup.notify_one();
    }

    /// Notification the host poll cycle waits on.
    pub fn host_wakeup(&self) -> &Notify {
        &self.host_wakeup
    }

    /// Display the host renders frames to.
    pub fn display(&self) -> Arc<BroadcastDisplay> {
        self.display.clone()
    }
}
