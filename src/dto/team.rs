//! DTO definitions used by the team REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::team_service::{TeamStatus, TeamView};

/// Registration request; the name is trimmed before use.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterTeamRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// What the team screen shows, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum TeamViewDto {
    /// The team answered wrong and waits for the next photo.
    Excluded,
    /// The round has not started or is paused.
    WaitingForHost,
    /// Another team holds the buzz lock.
    SomeoneElseAnswering { winner: String },
    /// This team holds the buzz lock.
    YouAreFirst,
    /// The buzzer is live.
    BuzzAvailable,
}

impl From<TeamView> for TeamViewDto {
    fn from(value: TeamView) -> Self {
        match value {
            TeamView::Excluded => TeamViewDto::Excluded,
            TeamView::WaitingForHost => TeamViewDto::WaitingForHost,
            TeamView::SomeoneElseAnswering { winner } => {
                TeamViewDto::SomeoneElseAnswering { winner }
            }
            TeamView::YouAreFirst => TeamViewDto::YouAreFirst,
            TeamView::BuzzAvailable => TeamViewDto::BuzzAvailable,
        }
    }
}

/// Result of a team poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamStatusResponse {
    pub team: String,
    pub subject: String,
    /// Set when the team had been removed and was registered again.
    pub reregistered: bool,
    #[serde(flatten)]
    pub view: TeamViewDto,
}

impl From<TeamStatus> for TeamStatusResponse {
    fn from(value: TeamStatus) -> Self {
        Self {
            team: value.team,
            subject: value.subject,
            reregistered: value.reregistered,
            view: value.view.into(),
        }
    }
}

/// Result of a buzz attempt.
#[derive(Debug, Serialize, ToSchema)]
pub struct BuzzResponse {
    /// Whether this team took the buzz lock.
    pub accepted: bool,
    /// Status read right after the attempt.
    pub status: TeamStatusResponse,
}
