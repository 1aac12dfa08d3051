use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{round_store::RoundStore, storage::StorageError},
    services::coordination::CoordinationStore,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECHECK_ATTEMPTS: u32 = 3;

/// Open the round store, make sure the document exists, and keep the shared
/// state in degraded mode whenever the store stops answering.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoundStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "round store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        let coordination = CoordinationStore::new(store.clone(), state.config().retry);
        if let Err(err) = coordination.ensure_initialized().await {
            warn!(error = %err, "failed to initialise round document; retrying");
            sleep(delay).await;
            delay = (delay * 2).min(MAX_DELAY);
            continue;
        }

        state.install_round_store(store.clone()).await;
        info!("round store ready; leaving degraded mode");
        state.wake_host();
        delay = INITIAL_DELAY;

        watch_health(&state, store.as_ref()).await;
        warn!("exhausted round store health checks; reopening the store");
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the store until it fails `MAX_RECHECK_ATTEMPTS` checks in a row.
async fn watch_health(state: &SharedState, store: &dyn RoundStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("round store healthy again; leaving degraded mode");
                    state.update_degraded(false);
                    state.wake_host();
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "round store health check failed; entering degraded mode");
                state.update_degraded(true);

                let mut recheck_delay = INITIAL_DELAY;
                let mut recovered = false;
                for attempt in 1..=MAX_RECHECK_ATTEMPTS {
                    sleep(recheck_delay).await;
                    match store.health_check().await {
                        Ok(()) => {
                            info!(attempt, "round store answered again");
                            recovered = true;
                            break;
                        }
                        Err(err) => {
                            warn!(attempt, error = %err, "round store recheck failed");
                            recheck_delay = (recheck_delay * 2).min(MAX_DELAY);
                        }
                    }
                }

                if !recovered {
                    return;
                }
                state.update_degraded(false);
                state.wake_host();
            }
        }
    }
}
