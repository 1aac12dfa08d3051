use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    error::AppError,
    services::sse_service::{subscribe_display, to_sse_stream},
    state::SharedState,
};

const PPM_CONTENT_TYPE: &str = "image/x-portable-pixmap";

/// Display endpoints: frame notifications and the frame pixels.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/display/stream", get(display_stream))
        .route("/display/frame", get(latest_frame))
}

/// Server-sent events stream announcing every new display frame.
#[utoipa::path(
    get,
    path = "/display/stream",
    tag = "display",
    responses((status = 200, description = "`frame` and `system` events", content_type = "text/event-stream", body = String))
)]
pub async fn display_stream(State(state): State<SharedState>) -> Response {
    to_sse_stream(subscribe_display(&state)).into_response()
}

/// Latest display frame as a binary PPM/PGM image.
#[utoipa::path(
    get,
    path = "/display/frame",
    tag = "display",
    responses(
        (status = 200, description = "Netpbm image", content_type = "image/x-portable-pixmap", body = Vec<u8>),
        (status = 404, description = "Nothing shown yet, or a text-only frame")
    )
)]
pub async fn latest_frame(State(state): State<SharedState>) -> Result<Response, AppError> {
    let frame = state
        .display()
        .latest()
        .ok_or_else(|| AppError::NotFound("no frame shown yet".into()))?;
    let pixels = frame
        .pixels
        .as_ref()
        .ok_or_else(|| AppError::NotFound("current frame has no pixels".into()))?;

    Ok(([(header::CONTENT_TYPE, PPM_CONTENT_TYPE)], pixels.to_netpbm()).into_response())
}
