use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Photos currently loaded in the deck.
    pub photos: usize,
}

impl HealthResponse {
    /// The round document is reachable.
    pub fn ok(photos: usize) -> Self {
        Self {
            status: "ok".to_string(),
            photos,
        }
    }

    /// The round document is unreachable; commands fail with 503.
    pub fn degraded(photos: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            photos,
        }
    }
}
