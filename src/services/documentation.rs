use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the photo buzzer server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::host::host_state,
        crate::routes::host::update_settings,
        crate::routes::host::set_subject,
        crate::routes::host::start_round,
        crate::routes::host::reveal_all,
        crate::routes::host::exclude_and_continue,
        crate::routes::host::pause_reveal,
        crate::routes::host::stop_round,
        crate::routes::host::next_photo,
        crate::routes::host::reload_photos,
        crate::routes::host::full_reset,
        crate::routes::host::list_teams,
        crate::routes::host::remove_team,
        crate::routes::host::fade_start,
        crate::routes::host::fade_pause,
        crate::routes::host::fade_stop,
        crate::routes::host::update_fade_settings,
        crate::routes::team::register,
        crate::routes::team::poll,
        crate::routes::team::buzz,
        crate::routes::display::display_stream,
        crate::routes::display::latest_frame,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::host::PhaseDto,
            crate::dto::host::ActionStatus,
            crate::dto::host::ActionResponse,
            crate::dto::host::TeamEntry,
            crate::dto::host::PhotoSummary,
            crate::dto::host::SettingsRequest,
            crate::dto::host::SettingsResponse,
            crate::dto::host::SubjectRequest,
            crate::dto::host::FadeBackgroundDto,
            crate::dto::host::FadeSettingsRequest,
            crate::dto::host::FadeStatus,
            crate::dto::host::DeckResponse,
            crate::dto::host::HostStateResponse,
            crate::dto::team::RegisterTeamRequest,
            crate::dto::team::TeamViewDto,
            crate::dto::team::TeamStatusResponse,
            crate::dto::team::BuzzResponse,
            crate::dto::sse::FrameKindDto,
            crate::dto::sse::FrameEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "host", description = "Round control for the host console"),
        (name = "fade", description = "Fade-in presentation controls"),
        (name = "team", description = "Team registration, polling and buzzing"),
        (name = "display", description = "Display frame stream and pixels"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/host/round/start",
            "/host/teams/{name}",
            "/team/{name}/buzz",
            "/display/frame",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
