//! First-press-wins buzz lock on top of the shared round document.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    services::coordination::CoordinationStore,
    state::round::{RoundState, RoundUpdate},
};

/// Grants the buzz lock to at most one team per round.
///
/// The check and the claim are two separate store operations, so two teams
/// buzzing within the same poll window can both pass the check; whichever
/// persists last ends up as the winner. An optional process-local gate
/// serialises the two steps for callers sharing this arbiter.
#[derive(Clone)]
pub struct BuzzerArbiter {
    store: CoordinationStore,
    gate: Option<Arc<Mutex<()>>>,
}

impl BuzzerArbiter {
    /// Arbiter with the plain check-then-write race.
    pub fn new(store: CoordinationStore) -> Self {
        Self { store, gate: None }
    }

    /// Arbiter serialising check and claim through `gate`.
    pub fn with_gate(store: CoordinationStore, gate: Arc<Mutex<()>>) -> Self {
        Self {
            store,
            gate: Some(gate),
        }
    }

    /// Try to take the buzz lock for `team`. Returns whether the claim was
    /// written; losing the race is not an error.
    pub async fn try_buzz(&self, team: &str) -> bool {
        let _guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        if !self.check(team).await {
            debug!(team = %team, "buzz refused");
            return false;
        }

        match self.claim(team).await {
            Some(_) => {
                info!(team = %team, "buzz accepted");
                true
            }
            None => false,
        }
    }

    /// Fresh read: whether `team` may take the lock right now.
    pub async fn check(&self, team: &str) -> bool {
        self.store.read().await.accepts_buzz_from(team)
    }

    /// Unconditionally record `team` as the lock holder.
    pub async fn claim(&self, team: &str) -> Option<RoundState> {
        self.store
            .write(RoundUpdate::new().winner(Some(team.to_string())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{dao::round_store::MemoryRoundStore, services::coordination::RetryPolicy};

    async fn active_round() -> CoordinationStore {
        let store = CoordinationStore::new(
            Arc::new(MemoryRoundStore::new()),
            RetryPolicy::new(1, Duration::ZERO),
        );
        store
            .write(
                RoundUpdate::new()
                    .active(true)
                    .game_started(true)
                    .order((0..4).collect()),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn first_sequential_buzz_wins() {
        let store = active_round().await;
        let arbiter = BuzzerArbiter::new(store.clone());

        assert!(arbiter.try_buzz("Red").await);
        assert!(!arbiter.try_buzz("Blue").await);
        assert_eq!(store.read().await.winner.as_deref(), Some("Red"));
    }

    #[tokio::test]
    async fn inactive_round_refuses_buzz() {
        let store = active_round().await;
        store.write(RoundUpdate::new().active(false)).await.unwrap();

        assert!(!BuzzerArbiter::new(store.clone()).try_buzz("Red").await);
        assert_eq!(store.read().await.winner, None);
    }

    #[tokio::test]
    async fn excluded_team_cannot_buzz_until_restart() {
        let store = active_round().await;
        store
            .write(RoundUpdate::new().excluded_teams(["Red".to_string()]))
            .await
            .unwrap();
        let arbiter = BuzzerArbiter::new(store.clone());

        assert!(!arbiter.try_buzz("Red").await);
        assert!(arbiter.try_buzz("Blue").await);
    }

    #[tokio::test]
    async fn interleaved_race_is_won_by_last_writer() {
        let store = active_round().await;
        let red = BuzzerArbiter::new(store.clone());
        let blue = BuzzerArbiter::new(store.clone());

        // both checks observe a free lock before either claim lands
        assert!(red.check("Red").await);
        assert!(blue.check("Blue").await);
        red.claim("Red").await.unwrap();
        blue.claim("Blue").await.unwrap();

        assert_eq!(store.read().await.winner.as_deref(), Some("Blue"));
    }

    #[tokio::test]
    async fn gated_arbiters_grant_a_single_winner() {
        let store = active_round().await;
        let gate = Arc::new(Mutex::new(()));
        let red = BuzzerArbiter::with_gate(store.clone(), gate.clone());
        let blue = BuzzerArbiter::with_gate(store.clone(), gate);

        let (red_won, blue_won) = tokio::join!(red.try_buzz("Red"), blue.try_buzz("Blue"));

        assert!(red_won ^ blue_won);
        let winner = store.read().await.winner;
        let expected = if red_won { "Red" } else { "Blue" };
        assert_eq!(winner.as_deref(), Some(expected));
    }
}
