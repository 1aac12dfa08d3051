//! Domain view of the shared round document and the partial updates applied to it.

use indexmap::IndexSet;

use crate::dao::models::RoundStateEntity;

/// Runtime representation of the shared round document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    /// Team currently holding the buzz lock, `None` when the lock is free.
    pub winner: Option<String>,
    /// Whether the round accepts buzzes and the reveal may progress.
    pub active: bool,
    /// Whether the host started the round for the current photo.
    pub game_started: bool,
    /// Whether the host forced the whole photo to be shown.
    pub show_all: bool,
    /// Cells uncovered so far; always a prefix of `order`.
    pub revealed: Vec<usize>,
    /// Permutation of every cell index, fixed for the current round.
    pub order: Vec<usize>,
    /// Teams barred from buzzing until the next round start.
    pub excluded_teams: IndexSet<String>,
    /// Registry of known team names, in registration order.
    pub connected_teams: IndexSet<String>,
    /// Category label shown to every participant.
    pub subject: String,
}

impl RoundState {
    /// Whether `team` would be granted the buzz lock right now.
    pub fn accepts_buzz_from(&self, team: &str) -> bool {
        self.active && self.winner.is_none() && !self.is_excluded(team)
    }

    /// Whether `team` is disqualified for the current photo.
    pub fn is_excluded(&self, team: &str) -> bool {
        self.excluded_teams.contains(team)
    }

    /// Whether `team` is present in the registry.
    pub fn is_registered(&self, team: &str) -> bool {
        self.connected_teams.contains(team)
    }

    /// Whether every cell of the current order has been uncovered.
    pub fn reveal_complete(&self) -> bool {
        !self.order.is_empty() && self.revealed.len() >= self.order.len()
    }

    /// Grid size implied by the current order, when it holds a square number of cells.
    pub fn grid_size(&self) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let side = self.order.len().isqrt();
        (side * side == self.order.len()).then_some(side)
    }
}

impl From<RoundStateEntity> for RoundState {
    fn from(value: RoundStateEntity) -> Self {
        Self {
            winner: value.winner,
            active: value.active,
            game_started: value.game_started,
            show_all: value.show_all,
            revealed: value.revealed,
            order: value.order,
            excluded_teams: value.excluded_teams.into_iter().collect(),
            connected_teams: value.connected_teams.into_iter().collect(),
            subject: value.subject,
        }
    }
}

impl From<RoundState> for RoundStateEntity {
    fn from(value: RoundState) -> Self {
        Self {
            winner: value.winner,
            active: value.active,
            revealed: value.revealed,
            order: value.order,
            excluded_teams: value.excluded_teams.into_iter().collect(),
            connected_teams: value.connected_teams.into_iter().collect(),
            subject: value.subject,
            game_started: value.game_started,
            show_all: value.show_all,
        }
    }
}

/// How a partial update touches the team registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamsUpdate {
    /// Add one name at the end; no-op when already registered.
    Append(String),
    /// Replace the whole registry (team removal, reset).
    Replace(Vec<String>),
}

/// Partial update of the round document: every `Some` field overwrites the
/// stored value, every `None` field is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundUpdate {
    winner: Option<Option<String>>,
    active: Option<bool>,
    game_started: Option<bool>,
    show_all: Option<bool>,
    revealed: Option<Vec<usize>>,
    order: Option<Vec<usize>>,
    excluded_teams: Option<IndexSet<String>>,
    connected_teams: Option<TeamsUpdate>,
    subject: Option<String>,
}

impl RoundUpdate {
    /// Start an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the buzz lock holder.
    pub fn winner(mut self, winner: Option<String>) -> Self {
        self.winner = Some(winner);
        self
    }

    /// Set the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Set the game-started flag.
    pub fn game_started(mut self, game_started: bool) -> Self {
        self.game_started = Some(game_started);
        self
    }

    /// Set the show-all flag.
    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = Some(show_all);
        self
    }

    /// Replace the revealed prefix.
    pub fn revealed(mut self, revealed: Vec<usize>) -> Self {
        self.revealed = Some(revealed);
        self
    }

    /// Replace the reveal order.
    pub fn order(mut self, order: Vec<usize>) -> Self {
        self.order = Some(order);
        self
    }

    /// Replace the excluded team set.
    pub fn excluded_teams(mut self, excluded: impl IntoIterator<Item = String>) -> Self {
        self.excluded_teams = Some(excluded.into_iter().collect());
        self
    }

    /// Append `name` to the team registry unless already present.
    pub fn register_team(mut self, name: impl Into<String>) -> Self {
        self.connected_teams = Some(TeamsUpdate::Append(name.into()));
        self
    }

    /// Replace the team registry wholesale.
    pub fn replace_teams(mut self, teams: Vec<String>) -> Self {
        self.connected_teams = Some(TeamsUpdate::Replace(teams));
        self
    }

    /// Set the category label.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Whether applying this update would leave any state unchanged.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the update on top of `state` and return the result.
    pub fn applied_to(self, mut state: RoundState) -> RoundState {
        if let Some(winner) = self.winner {
            state.winner = winner;
        }
        if let Some(active) = self.active {
            state.active = active;
        }
        if let Some(game_started) = self.game_started {
            state.game_started = game_started;
        }
        if let Some(show_all) = self.show_all {
            state.show_all = show_all;
        }
        if let Some(revealed) = self.revealed {
            state.revealed = revealed;
        }
        if let Some(order) = self.order {
            state.order = order;
        }
        if let Some(excluded) = self.excluded_teams {
            state.excluded_teams = excluded;
        }
        match self.connected_teams {
            Some(TeamsUpdate::Append(name)) => {
                state.connected_teams.insert(name);
            }
            Some(TeamsUpdate::Replace(teams)) => {
                state.connected_teams = teams.into_iter().collect();
            }
            None => {}
        }
        if let Some(subject) = self.subject {
            state.subject = subject;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_twice_keeps_registry_unchanged() {
        let once = RoundUpdate::new()
            .register_team("Red")
            .applied_to(RoundState::default());
        let twice = RoundUpdate::new().register_team("Red").applied_to(once.clone());

        assert_eq!(once.connected_teams, twice.connected_teams);
        assert_eq!(twice.connected_teams.len(), 1);
    }

    #[test]
    fn registration_preserves_insertion_order() {
        let state = ["Red", "Blue", "Green", "Blue"]
            .into_iter()
            .fold(RoundState::default(), |state, name| {
                RoundUpdate::new().register_team(name).applied_to(state)
            });

        let names: Vec<_> = state.connected_teams.iter().map(String::as_str).collect();
        assert_eq!(names, ["Red", "Blue", "Green"]);
    }

    #[test]
    fn replace_teams_overwrites_registry() {
        let state = RoundUpdate::new()
            .register_team("Red")
            .applied_to(RoundState::default());
        let state = RoundUpdate::new()
            .replace_teams(vec!["Blue".into()])
            .applied_to(state);

        assert!(!state.is_registered("Red"));
        assert!(state.is_registered("Blue"));
    }

    #[test]
    fn untouched_fields_survive_partial_update() {
        let state = RoundState {
            winner: Some("Red".into()),
            subject: "Animals".into(),
            order: vec![1, 0, 3, 2],
            ..RoundState::default()
        };

        let next = RoundUpdate::new().revealed(vec![1]).applied_to(state);

        assert_eq!(next.winner.as_deref(), Some("Red"));
        assert_eq!(next.subject, "Animals");
        assert_eq!(next.revealed, vec![1]);
    }

    #[test]
    fn clearing_winner_is_distinct_from_leaving_it() {
        let state = RoundState {
            winner: Some("Red".into()),
            ..RoundState::default()
        };

        let cleared = RoundUpdate::new().winner(None).applied_to(state.clone());
        assert_eq!(cleared.winner, None);
        assert!(RoundUpdate::new().is_empty());
        assert!(!RoundUpdate::new().winner(None).is_empty());
    }

    #[test]
    fn entity_conversion_drops_duplicate_names() {
        let entity = RoundStateEntity {
            connected_teams: vec!["Red".into(), "Red".into(), "Blue".into()],
            excluded_teams: vec!["Blue".into(), "Blue".into()],
            ..RoundStateEntity::default()
        };

        let state = RoundState::from(entity);
        assert_eq!(state.connected_teams.len(), 2);
        assert_eq!(state.excluded_teams.len(), 1);
    }

    #[test]
    fn buzz_acceptance_requires_active_free_lock_and_eligibility() {
        let mut state = RoundState {
            active: true,
            ..RoundState::default()
        };
        assert!(state.accepts_buzz_from("Red"));

        state.excluded_teams.insert("Red".into());
        assert!(!state.accepts_buzz_from("Red"));
        assert!(state.accepts_buzz_from("Blue"));

        state.winner = Some("Green".into());
        assert!(!state.accepts_buzz_from("Blue"));

        state.winner = None;
        state.active = false;
        assert!(!state.accepts_buzz_from("Blue"));
    }

    #[test]
    fn grid_size_follows_order_length() {
        let state = RoundState {
            order: (0..100).collect(),
            ..RoundState::default()
        };
        assert_eq!(state.grid_size(), Some(10));
        assert_eq!(RoundState::default().grid_size(), None);

        let uneven = RoundState {
            order: vec![0, 1, 2],
            ..RoundState::default()
        };
        assert_eq!(uneven.grid_size(), None);
    }
}
