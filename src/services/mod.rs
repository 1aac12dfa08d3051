/// Buzz lock arbitration.
pub mod buzzer;
/// Retrying access to the shared round document.
pub mod coordination;
/// Display boundary and the broadcasting display.
pub mod display;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Host console commands.
pub mod host_service;
/// Grid reveal, fade ticker and the host poll cycle.
pub mod reveal_service;
/// Server-Sent Events forwarding.
pub mod sse_service;
/// Round store supervision and degraded mode.
pub mod storage_supervisor;
/// Team registration, polling and buzzing.
pub mod team_service;
