use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use validator::Validate;

use crate::{
    dto::host::{
        ActionResponse, DeckResponse, FadeSettingsRequest, FadeStatus, HostStateResponse,
        SettingsRequest, SettingsResponse, SubjectRequest, TeamEntry,
    },
    error::AppError,
    services::host_service,
    state::SharedState,
};

/// Host console endpoints driving the round, the deck and the fade-in.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/host/state", get(host_state))
        .route("/host/settings", put(update_settings))
        .route("/host/subject", put(set_subject))
        .route("/host/round/start", post(start_round))
        .route("/host/round/reveal-all", post(reveal_all))
        .route("/host/round/exclude", post(exclude_and_continue))
        .route("/host/round/pause", post(pause_reveal))
        .route("/host/round/stop", post(stop_round))
        .route("/host/photo/next", post(next_photo))
        .route("/host/photos/reload", post(reload_photos))
        .route("/host/reset", post(full_reset))
        .route("/host/teams", get(list_teams))
        .route("/host/teams/{name}", delete(remove_team))
        .route("/host/fade/start", post(fade_start))
        .route("/host/fade/pause", post(fade_pause))
        .route("/host/fade/stop", post(fade_stop))
        .route("/host/fade/settings", put(update_fade_settings))
}

/// Current phase, photo, round progress and settings.
#[utoipa::path(
    get,
    path = "/host/state",
    tag = "host",
    responses(
        (status = 200, description = "Host console snapshot", body = HostStateResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn host_state(
    State(state): State<SharedState>,
) -> Result<Json<HostStateResponse>, AppError> {
    Ok(Json(host_service::host_state(&state).await?))
}

/// Update the grid size (next start) and/or the reveal delay.
#[utoipa::path(
    put,
    path = "/host/settings",
    tag = "host",
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Settings applied", body = SettingsResponse),
        (status = 400, description = "Value out of range")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(host_service::update_settings(&state, payload).await?))
}

/// Set the category label shown to everyone.
#[utoipa::path(
    put,
    path = "/host/subject",
    tag = "host",
    request_body = SubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn set_subject(
    State(state): State<SharedState>,
    Json(payload): Json<SubjectRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(host_service::set_subject(&state, &payload.subject).await?))
}

/// Start the round with a freshly shuffled order.
#[utoipa::path(
    post,
    path = "/host/round/start",
    tag = "host",
    responses(
        (status = 200, description = "Round started, or waiting for a photo", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::start_round(&state).await?))
}

/// Uncover the whole photo and close the buzzers.
#[utoipa::path(
    post,
    path = "/host/round/reveal-all",
    tag = "host",
    responses(
        (status = 200, description = "Photo revealed", body = ActionResponse),
        (status = 409, description = "No round in progress")
    )
)]
pub async fn reveal_all(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::reveal_all(&state).await?))
}

/// Reject the answering team and resume the reveal.
#[utoipa::path(
    post,
    path = "/host/round/exclude",
    tag = "host",
    responses(
        (status = 200, description = "Team excluded, reveal resumed", body = ActionResponse),
        (status = 409, description = "No team is answering")
    )
)]
pub async fn exclude_and_continue(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::exclude_and_continue(&state).await?))
}

/// Hold the grid reveal, or resume it where it stopped.
#[utoipa::path(
    post,
    path = "/host/round/pause",
    tag = "host",
    responses(
        (status = 200, description = "Reveal paused or resumed", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn pause_reveal(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::pause_reveal(&state).await?))
}

/// Abandon the round and show the start screen for the same photo.
#[utoipa::path(
    post,
    path = "/host/round/stop",
    tag = "host",
    responses(
        (status = 200, description = "Round stopped", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn stop_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::stop_round(&state).await?))
}

/// Clear the round and select the next photo.
#[utoipa::path(
    post,
    path = "/host/photo/next",
    tag = "host",
    responses(
        (status = 200, description = "Next photo selected", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn next_photo(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::next_photo(&state).await?))
}

/// Reload the photo deck from disk.
#[utoipa::path(
    post,
    path = "/host/photos/reload",
    tag = "host",
    responses(
        (status = 200, description = "Photos now in the deck", body = DeckResponse),
        (status = 500, description = "Photo directory unreadable")
    )
)]
pub async fn reload_photos(
    State(state): State<SharedState>,
) -> Result<Json<DeckResponse>, AppError> {
    Ok(Json(host_service::reload_photos(&state).await?))
}

/// Reset the whole game, team registry included.
#[utoipa::path(
    post,
    path = "/host/reset",
    tag = "host",
    responses(
        (status = 200, description = "Game reset", body = ActionResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn full_reset(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(host_service::full_reset(&state).await?))
}

/// Registered teams.
#[utoipa::path(
    get,
    path = "/host/teams",
    tag = "host",
    responses((status = 200, description = "Registered teams", body = [TeamEntry]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamEntry>>, AppError> {
    Ok(Json(host_service::list_teams(&state).await?))
}

/// Remove a team from the registry.
#[utoipa::path(
    delete,
    path = "/host/teams/{name}",
    tag = "host",
    params(("name" = String, Path, description = "Team name")),
    responses(
        (status = 200, description = "Remaining teams", body = [TeamEntry]),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn remove_team(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<TeamEntry>>, AppError> {
    Ok(Json(host_service::remove_team(&state, &name).await?))
}

/// Start the fade-in from a blank canvas.
#[utoipa::path(
    post,
    path = "/host/fade/start",
    tag = "fade",
    responses(
        (status = 200, description = "Fade started", body = FadeStatus),
        (status = 409, description = "No photo selected")
    )
)]
pub async fn fade_start(State(state): State<SharedState>) -> Result<Json<FadeStatus>, AppError> {
    Ok(Json(host_service::fade_start(&state).await?))
}

/// Pause or resume the fade-in.
#[utoipa::path(
    post,
    path = "/host/fade/pause",
    tag = "fade",
    responses((status = 200, description = "Fade toggled", body = FadeStatus))
)]
pub async fn fade_pause(State(state): State<SharedState>) -> Result<Json<FadeStatus>, AppError> {
    Ok(Json(host_service::fade_pause(&state).await?))
}

/// Stop the fade-in.
#[utoipa::path(
    post,
    path = "/host/fade/stop",
    tag = "fade",
    responses((status = 200, description = "Fade stopped", body = FadeStatus))
)]
pub async fn fade_stop(State(state): State<SharedState>) -> Result<Json<FadeStatus>, AppError> {
    Ok(Json(host_service::fade_stop(&state).await?))
}

/// Change the fade step and/or background.
#[utoipa::path(
    put,
    path = "/host/fade/settings",
    tag = "fade",
    request_body = FadeSettingsRequest,
    responses(
        (status = 200, description = "Fade settings applied", body = FadeStatus),
        (status = 400, description = "Step out of range")
    )
)]
pub async fn update_fade_settings(
    State(state): State<SharedState>,
    Json(payload): Json<FadeSettingsRequest>,
) -> Result<Json<FadeStatus>, AppError> {
    payload.validate()?;
    Ok(Json(
        host_service::update_fade_settings(&state, payload).await?,
    ))
}
