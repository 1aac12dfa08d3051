use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::team::{BuzzResponse, RegisterTeamRequest, TeamStatusResponse},
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Team endpoints: registration, polling and the buzzer.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/team/register", post(register))
        .route("/team/{name}", get(poll))
        .route("/team/{name}/buzz", post(buzz))
}

/// Register a team. Registering an existing name is a no-op.
#[utoipa::path(
    post,
    path = "/team/register",
    tag = "team",
    request_body = RegisterTeamRequest,
    responses(
        (status = 200, description = "Team registered", body = TeamStatusResponse),
        (status = 400, description = "Invalid team name"),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterTeamRequest>,
) -> Result<Json<TeamStatusResponse>, AppError> {
    payload.validate()?;
    let store = state.coordination().await?;
    let name = team_service::register(&store, &payload.name).await?;
    let status = team_service::poll(&store, &name).await?;
    Ok(Json(status.into()))
}

/// Poll the team screen. A removed team is registered again.
#[utoipa::path(
    get,
    path = "/team/{name}",
    tag = "team",
    params(("name" = String, Path, description = "Team name")),
    responses(
        (status = 200, description = "Team view", body = TeamStatusResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn poll(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<TeamStatusResponse>, AppError> {
    let store = state.coordination().await?;
    Ok(Json(team_service::poll(&store, &name).await?.into()))
}

/// Try to take the buzz lock.
#[utoipa::path(
    post,
    path = "/team/{name}/buzz",
    tag = "team",
    params(("name" = String, Path, description = "Team name")),
    responses(
        (status = 200, description = "Buzz processed; `accepted` tells whether the lock was taken", body = BuzzResponse),
        (status = 503, description = "Round document unreachable")
    )
)]
pub async fn buzz(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<BuzzResponse>, AppError> {
    let store = state.coordination().await?;
    let arbiter = state.buzzer().await?;
    let (accepted, status) = team_service::buzz(&store, &arbiter, &name).await?;
    if accepted {
        state.wake_host();
    }
    Ok(Json(BuzzResponse {
        accepted,
        status: status.into(),
    }))
}
