use serde::{Deserialize, Serialize};

/// Shared round document exactly as it is persisted by the storage layer.
///
/// Every key is optional on read so documents written by older or newer
/// builds keep loading: a missing key takes its default value and unknown
/// keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoundStateEntity {
    /// Team currently holding the buzz lock.
    pub winner: Option<String>,
    /// Whether the round accepts buzzes and the reveal may progress.
    pub active: bool,
    /// Cells uncovered so far, in reveal order.
    pub revealed: Vec<usize>,
    /// Predetermined reveal order for the current photo.
    pub order: Vec<usize>,
    /// Teams barred from buzzing for the current photo.
    pub excluded_teams: Vec<String>,
    /// Registry of known team names.
    pub connected_teams: Vec<String>,
    /// Free-text category label shown to everyone.
    pub subject: String,
    /// Whether the host started the round for the current photo.
    pub game_started: bool,
    /// Whether the host forced the full photo to be shown.
    pub show_all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let entity: RoundStateEntity =
            serde_json::from_str(r#"{"connected_teams": ["Red"], "revealed": []}"#).unwrap();

        assert_eq!(entity.connected_teams, vec!["Red".to_string()]);
        assert_eq!(entity.winner, None);
        assert!(!entity.active);
        assert!(entity.order.is_empty());
        assert!(entity.subject.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let entity: RoundStateEntity =
            serde_json::from_str(r#"{"winner": "Blue", "photo_idx": 3}"#).unwrap();
        assert_eq!(entity.winner.as_deref(), Some("Blue"));
    }

    #[test]
    fn null_winner_round_trips_as_absent_lock() {
        let json = serde_json::to_string(&RoundStateEntity::default()).unwrap();
        assert!(json.contains(r#""winner":null"#));
    }
}
