//! DTO definitions used by the host REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::{
    host::{FadeSession, RevealSettings},
    reveal::FadeBackground,
    state_machine::HostPhase,
};

/// Host phase as exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseDto {
    /// No photo selected.
    Idle,
    /// Photo selected, round not started.
    Ready,
    /// Reveal running, buzzes accepted.
    Active,
    /// A team is answering.
    Locked,
    /// Whole photo shown.
    Revealed,
}

impl From<HostPhase> for PhaseDto {
    fn from(value: HostPhase) -> Self {
        match value {
            HostPhase::Idle => PhaseDto::Idle,
            HostPhase::Ready => PhaseDto::Ready,
            HostPhase::Active => PhaseDto::Active,
            HostPhase::Locked => PhaseDto::Locked,
            HostPhase::Revealed => PhaseDto::Revealed,
        }
    }
}

/// Whether a host command changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// The command was applied.
    Applied,
    /// The command needs a photo first; nothing changed.
    Waiting,
}

/// Generic acknowledgement returned by host commands.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub status: ActionStatus,
    pub message: String,
    /// Phase after the command.
    pub phase: PhaseDto,
}

impl ActionResponse {
    /// The command was applied.
    pub fn applied(message: impl Into<String>, phase: HostPhase) -> Self {
        Self {
            status: ActionStatus::Applied,
            message: message.into(),
            phase: phase.into(),
        }
    }

    /// The command was ignored because the host is not set up yet.
    pub fn waiting(message: impl Into<String>, phase: HostPhase) -> Self {
        Self {
            status: ActionStatus::Waiting,
            message: message.into(),
            phase: phase.into(),
        }
    }
}

/// Team registry entry with its eligibility for the current photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamEntry {
    pub name: String,
    pub excluded: bool,
}

/// Selected photo.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoSummary {
    /// Position in the deck, starting at 0.
    pub index: usize,
    pub name: String,
    pub width: usize,
    pub height: usize,
}

/// Grid reveal settings.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub grid_size: usize,
    pub reveal_delay_secs: f64,
}

impl From<RevealSettings> for SettingsResponse {
    fn from(value: RevealSettings) -> Self {
        Self {
            grid_size: value.grid_size,
            reveal_delay_secs: value.reveal_delay.as_secs_f64(),
        }
    }
}

/// Partial update of the grid reveal settings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SettingsRequest {
    /// Cells per side, applied from the next round start.
    #[validate(range(min = 4, max = 30))]
    pub grid_size: Option<usize>,
    /// Seconds between two uncovered cells.
    #[validate(range(min = 0.05, max = 2.0))]
    pub reveal_delay_secs: Option<f64>,
}

/// New category label.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubjectRequest {
    #[validate(length(max = 120))]
    pub subject: String,
}

/// Fade background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FadeBackgroundDto {
    White,
    Black,
}

impl From<FadeBackground> for FadeBackgroundDto {
    fn from(value: FadeBackground) -> Self {
        match value {
            FadeBackground::White => FadeBackgroundDto::White,
            FadeBackground::Black => FadeBackgroundDto::Black,
        }
    }
}

impl From<FadeBackgroundDto> for FadeBackground {
    fn from(value: FadeBackgroundDto) -> Self {
        match value {
            FadeBackgroundDto::White => FadeBackground::White,
            FadeBackgroundDto::Black => FadeBackground::Black,
        }
    }
}

/// Partial update of the fade-in settings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FadeSettingsRequest {
    /// Alpha increment per tick.
    #[validate(range(min = 0.005, max = 0.1))]
    pub step: Option<f32>,
    pub background: Option<FadeBackgroundDto>,
}

/// Fade-in state.
#[derive(Debug, Serialize, ToSchema)]
pub struct FadeStatus {
    pub playing: bool,
    pub alpha: f32,
    pub step: f32,
    pub background: FadeBackgroundDto,
}

impl From<&FadeSession> for FadeStatus {
    fn from(value: &FadeSession) -> Self {
        Self {
            playing: value.is_playing(),
            alpha: value.alpha(),
            step: value.step(),
            background: value.background().into(),
        }
    }
}

/// Photos available after a deck reload.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeckResponse {
    pub photos: Vec<String>,
}

/// Everything the host console shows.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostStateResponse {
    pub phase: PhaseDto,
    pub subject: String,
    pub photo: Option<PhotoSummary>,
    pub photo_count: usize,
    /// Team holding the buzz lock.
    pub winner: Option<String>,
    /// Cells uncovered so far.
    pub revealed: usize,
    /// Cells in the current round's grid, 0 before the round starts.
    pub total_cells: usize,
    pub teams: Vec<TeamEntry>,
    /// The host holds the grid reveal.
    pub paused: bool,
    pub settings: SettingsResponse,
    pub fade: FadeStatus,
}
