use thiserror::Error;

use crate::state::round::RoundState;

/// High-level phases of the host console.
///
/// The phase is never stored: it is derived from the shared round document and
/// the host-local photo selection, so every participant that reads the same
/// document agrees on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// No photo is selected yet.
    Idle,
    /// A photo is selected and waits for the host to start the round.
    Ready,
    /// The reveal is running and buzzes are accepted.
    Active,
    /// A team holds the buzz lock and is answering.
    Locked,
    /// The host uncovered the whole photo.
    Revealed,
}

impl HostPhase {
    /// Derive the phase, first matching rule wins.
    pub fn derive(round: &RoundState, photo_selected: bool) -> Self {
        if !photo_selected {
            HostPhase::Idle
        } else if round.show_all {
            HostPhase::Revealed
        } else if round.winner.is_some() {
            HostPhase::Locked
        } else if round.game_started && round.active {
            HostPhase::Active
        } else {
            HostPhase::Ready
        }
    }

    /// Lower-case label used in API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            HostPhase::Idle => "idle",
            HostPhase::Ready => "ready",
            HostPhase::Active => "active",
            HostPhase::Locked => "locked",
            HostPhase::Revealed => "revealed",
        }
    }
}

/// Commands the host can apply to the round document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Start (or restart) the round for the current photo with a fresh order.
    Start {
        /// Reveal order for the new round.
        order: Vec<usize>,
    },
    /// Uncover the whole photo and stop accepting buzzes.
    RevealAll,
    /// Reject the answering team for this photo and resume the reveal.
    ExcludeAndContinue,
    /// Abandon the round and go back to the start screen for the same photo.
    Stop,
    /// Move to the next photo of the deck.
    NextPhoto,
    /// Reset the whole document, team registry included.
    FullReset,
}

impl HostCommand {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            HostCommand::Start { .. } => "start",
            HostCommand::RevealAll => "reveal_all",
            HostCommand::ExcludeAndContinue => "exclude_and_continue",
            HostCommand::Stop => "stop",
            HostCommand::NextPhoto => "next_photo",
            HostCommand::FullReset => "full_reset",
        }
    }

    /// Apply the command's field effects to `round`. Does not check the phase.
    pub fn apply(self, mut round: RoundState) -> RoundState {
        match self {
            HostCommand::Start { order } => {
                round.winner = None;
                round.revealed.clear();
                round.order = order;
                round.excluded_teams.clear();
                round.active = true;
                round.game_started = true;
                round.show_all = false;
            }
            HostCommand::RevealAll => {
                round.show_all = true;
                round.active = false;
            }
            HostCommand::ExcludeAndContinue => {
                if let Some(team) = round.winner.take() {
                    round.excluded_teams.insert(team);
                }
                round.active = true;
            }
            HostCommand::Stop | HostCommand::NextPhoto => {
                round.winner = None;
                round.revealed.clear();
                round.order.clear();
                round.excluded_teams.clear();
                round.active = false;
                round.game_started = false;
                round.show_all = false;
            }
            HostCommand::FullReset => round = RoundState::default(),
        }
        round
    }
}

/// Error returned when a command is not allowed from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {command} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the host was in when the command was received.
    pub from: HostPhase,
    /// Name of the rejected command.
    pub command: &'static str,
}

/// Compute the phase a command leads to if it is valid from `from`.
pub fn compute_transition(
    from: HostPhase,
    command: &HostCommand,
) -> Result<HostPhase, InvalidTransition> {
    use HostPhase::*;

    let next = match (from, command) {
        (Ready | Active | Locked | Revealed, HostCommand::Start { .. }) => Active,
        (Ready | Active | Locked | Revealed, HostCommand::RevealAll) => Revealed,
        (Locked, HostCommand::ExcludeAndContinue) => Active,
        (Ready | Active | Locked | Revealed, HostCommand::Stop) => Ready,
        (_, HostCommand::NextPhoto) => Ready,
        (_, HostCommand::FullReset) => Idle,
        (from, command) => {
            return Err(InvalidTransition {
                from,
                command: command.name(),
            });
        }
    };

    Ok(next)
}

/// Validate `command` against the phase derived from `round` and return the
/// updated document.
pub fn plan(
    round: RoundState,
    photo_selected: bool,
    command: HostCommand,
) -> Result<RoundState, InvalidTransition> {
    let from = HostPhase::derive(&round, photo_selected);
    compute_transition(from, &command)?;
    Ok(command.apply(round))
}
