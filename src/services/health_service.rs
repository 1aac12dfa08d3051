use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Check the round store and report whether the game can be coordinated.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.round_store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "round store health check failed");
                false
            }
        },
        None => {
            warn!("round store unavailable (degraded mode)");
            false
        }
    };

    let host = state.host().lock().await;
    let photos = host.deck().len();
    drop(host);

    if reachable && !state.is_degraded() {
        HealthResponse::ok(photos)
    } else {
        HealthResponse::degraded(photos)
    }
}
