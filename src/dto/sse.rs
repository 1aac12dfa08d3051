use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// What a display frame shows.
pub enum FrameKindDto {
    /// Nothing to show yet (waiting for a photo or for the round start).
    Placeholder,
    /// Grid reveal in progress.
    Partial,
    /// Whole photo.
    Full,
    /// Fade-in step.
    Fade,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast as a `frame` event whenever the display changes. The pixels are
/// served separately by `GET /display/frame`.
pub struct FrameEvent {
    /// Monotonic frame counter for this server process.
    pub sequence: u64,
    /// Frame category.
    pub kind: FrameKindDto,
    /// Text shown over the frame, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Uncovered cells for grid frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed: Option<usize>,
    /// Total cells for grid frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Blend factor for fade frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    /// Frame width in pixels, absent for text-only frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    /// Frame height in pixels, absent for text-only frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the round document is currently unreachable.
    pub degraded: bool,
}
