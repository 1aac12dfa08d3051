//! Team side of the game: registration, polling and buzzing.

use std::time::Duration;

use tokio::{sync::mpsc, time::sleep};
use tracing::{info, warn};

use crate::{
    error::ServiceError,
    services::{buzzer::BuzzerArbiter, coordination::CoordinationStore},
    state::round::{RoundState, RoundUpdate},
};

/// Longest accepted team name, counted in characters after trimming.
pub const MAX_TEAM_NAME_CHARS: usize = 40;

/// What a team screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamView {
    /// Rejected for the current photo.
    Excluded,
    /// Round not started or not accepting buzzes.
    WaitingForHost,
    /// Another team holds the buzz lock.
    SomeoneElseAnswering {
        /// Team holding the lock.
        winner: String,
    },
    /// This team holds the buzz lock.
    YouAreFirst,
    /// The buzzer is live.
    BuzzAvailable,
}

impl TeamView {
    /// Compute the view of `team`; the first matching rule wins.
    pub fn of(round: &RoundState, team: &str) -> Self {
        if round.is_excluded(team) {
            return TeamView::Excluded;
        }
        if !round.game_started || !round.active {
            return TeamView::WaitingForHost;
        }
        match &round.winner {
            Some(winner) if winner != team => TeamView::SomeoneElseAnswering {
                winner: winner.clone(),
            },
            Some(_) => TeamView::YouAreFirst,
            None => TeamView::BuzzAvailable,
        }
    }
}

/// Result of one team poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStatus {
    /// Team name.
    pub team: String,
    /// Screen to show.
    pub view: TeamView,
    /// Category label.
    pub subject: String,
    /// The team was missing from the registry and has been added back.
    pub reregistered: bool,
}

/// Trim `raw` and check its length.
pub fn normalize_team_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars == 0 || chars > MAX_TEAM_NAME_CHARS {
        return Err(ServiceError::InvalidInput(format!(
            "team name must be 1 to {MAX_TEAM_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

/// Add `raw` to the team registry. Registering twice is a no-op.
pub async fn register(store: &CoordinationStore, raw: &str) -> Result<String, ServiceError> {
    let name = normalize_team_name(raw)?;
    store
        .try_write(RoundUpdate::new().register_team(name.clone()))
        .await?;
    info!(team = %name, "team registered");
    Ok(name)
}

/// Read the round and compute the team's view, registering the team again
/// when the host removed it or reset the game.
pub async fn poll(store: &CoordinationStore, raw: &str) -> Result<TeamStatus, ServiceError> {
    let team = normalize_team_name(raw)?;
    let round = store.read().await;

    let reregistered = !round.is_registered(&team);
    if reregistered {
        match store.write(RoundUpdate::new().register_team(team.clone())).await {
            Some(_) => info!(team = %team, "team re-registered after removal"),
            None => warn!(team = %team, "could not re-register team"),
        }
    }

    Ok(TeamStatus {
        view: TeamView::of(&round, &team),
        subject: round.subject,
        team,
        reregistered,
    })
}

/// Try to take the buzz lock, then report the team's view.
pub async fn buzz(
    store: &CoordinationStore,
    arbiter: &BuzzerArbiter,
    raw: &str,
) -> Result<(bool, TeamStatus), ServiceError> {
    let team = normalize_team_name(raw)?;
    let accepted = arbiter.try_buzz(&team).await;
    let status = poll(store, &team).await?;
    Ok((accepted, status))
}

/// Fixed-cadence team loop used by terminal clients.
pub struct TeamPoller {
    store: CoordinationStore,
    arbiter: BuzzerArbiter,
    team: String,
    interval: Duration,
}

/// Something the poller wants the client to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    /// The team view changed.
    Status(TeamStatus),
    /// A buzz request was processed.
    Buzzed {
        /// Whether the lock was taken.
        accepted: bool,
    },
}

impl TeamPoller {
    /// Poller for `team` over `store`, checking every `interval`.
    pub fn new(
        store: CoordinationStore,
        arbiter: BuzzerArbiter,
        team: String,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            arbiter,
            team,
            interval,
        }
    }

    /// Poll until `buzz_requests` closes, forwarding every buzz request and
    /// reporting view changes to `report`.
    ///
    /// Failed health checks are retried with the store's retry policy; the
    /// poller only fails once that many checks in a row did not pass.
    pub async fn run<F>(
        self,
        mut buzz_requests: mpsc::Receiver<()>,
        mut report: F,
    ) -> Result<(), ServiceError>
    where
        F: FnMut(PollerEvent),
    {
        let retry = self.store.retry();
        let mut failures = 0;
        let mut last: Option<TeamStatus> = None;
        loop {
            match self.store.health_check().await {
                Ok(()) => failures = 0,
                Err(err) => {
                    failures += 1;
                    if failures >= retry.attempts() {
                        return Err(err.into());
                    }
                    warn!(
                        team = %self.team,
                        attempt = failures,
                        error = %err,
                        "health check failed; retrying"
                    );
                    sleep(retry.delay(failures)).await;
                    continue;
                }
            }

            let status = poll(&self.store, &self.team).await?;
            if last.as_ref() != Some(&status) {
                report(PollerEvent::Status(status.clone()));
                last = Some(status);
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                request = buzz_requests.recv() => match request {
                    Some(()) => {
                        let accepted = self.arbiter.try_buzz(&self.team).await;
                        report(PollerEvent::Buzzed { accepted });
                    }
                    None => return Ok(()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{
            models::RoundStateEntity,
            round_store::{MemoryRoundStore, RoundStore},
            storage::{StorageError, StorageResult},
        },
        services::coordination::RetryPolicy,
    };

    /// Memory store whose health checks fail for the calls in `failing`.
    struct FlakyHealth {
        inner: MemoryRoundStore,
        checks: AtomicU32,
        failing: std::ops::Range<u32>,
    }

    impl RoundStore for FlakyHealth {
        fn load(&self) -> BoxFuture<'static, StorageResult<Option<RoundStateEntity>>> {
            self.inner.load()
        }

        fn replace(&self, round: RoundStateEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.replace(round)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            let call = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.contains(&call) {
                return Box::pin(async {
                    Err(StorageError::unavailable("health".into(), std::io::Error::other("busy")))
                });
            }
            self.inner.health_check()
        }
    }

    async fn flaky_poller(failing: std::ops::Range<u32>) -> (CoordinationStore, TeamPoller) {
        let backend = FlakyHealth {
            inner: MemoryRoundStore::new(),
            checks: AtomicU32::new(0),
            failing,
        };
        let store = CoordinationStore::new(Arc::new(backend), RetryPolicy::new(3, Duration::ZERO));
        register(&store, "Red").await.unwrap();
        start_round(&store).await;
        let poller = TeamPoller::new(
            store.clone(),
            BuzzerArbiter::new(store.clone()),
            "Red".into(),
            Duration::from_millis(5),
        );
        (store, poller)
    }

    fn store() -> CoordinationStore {
        CoordinationStore::new(
            Arc::new(MemoryRoundStore::new()),
            RetryPolicy::new(1, Duration::ZERO),
        )
    }

    async fn start_round(store: &CoordinationStore) {
        store
            .write(
                RoundUpdate::new()
                    .order((0..4).collect())
                    .active(true)
                    .game_started(true)
                    .winner(None)
                    .excluded_teams(Vec::new()),
            )
            .await
            .unwrap();
    }

    #[test]
    fn view_priority_puts_exclusion_first() {
        let mut round = RoundState {
            active: true,
            game_started: true,
            winner: Some("Blue".into()),
            ..RoundState::default()
        };
        round.excluded_teams.insert("Red".into());

        assert_eq!(TeamView::of(&round, "Red"), TeamView::Excluded);
        assert_eq!(
            TeamView::of(&round, "Green"),
            TeamView::SomeoneElseAnswering {
                winner: "Blue".into()
            }
        );
        assert_eq!(TeamView::of(&round, "Blue"), TeamView::YouAreFirst);

        round.winner = None;
        assert_eq!(TeamView::of(&round, "Green"), TeamView::BuzzAvailable);

        round.active = false;
        assert_eq!(TeamView::of(&round, "Green"), TeamView::WaitingForHost);
        assert_eq!(TeamView::of(&round, "Red"), TeamView::Excluded);
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(normalize_team_name("  Red  ").unwrap(), "Red");
        assert!(normalize_team_name("   ").is_err());
        assert!(normalize_team_name(&"x".repeat(41)).is_err());
        assert!(normalize_team_name(&"é".repeat(40)).is_ok());
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let store = store();
        register(&store, "Red").await.unwrap();
        register(&store, " Red ").await.unwrap();

        let round = store.read().await;
        assert_eq!(round.connected_teams.len(), 1);
    }

    #[tokio::test]
    async fn removed_team_is_registered_again_on_poll() {
        let store = store();
        register(&store, "Red").await.unwrap();
        store
            .write(RoundUpdate::new().replace_teams(Vec::new()))
            .await
            .unwrap();

        let status = poll(&store, "Red").await.unwrap();
        assert!(status.reregistered);
        assert!(store.read().await.is_registered("Red"));

        let status = poll(&store, "Red").await.unwrap();
        assert!(!status.reregistered);
    }

    #[tokio::test]
    async fn red_then_blue_buzz() {
        let store = store();
        register(&store, "Red").await.unwrap();
        register(&store, "Blue").await.unwrap();
        start_round(&store).await;
        let arbiter = BuzzerArbiter::new(store.clone());

        let (accepted, red) = buzz(&store, &arbiter, "Red").await.unwrap();
        assert!(accepted);
        assert_eq!(red.view, TeamView::YouAreFirst);

        let (accepted, blue) = buzz(&store, &arbiter, "Blue").await.unwrap();
        assert!(!accepted);
        assert_eq!(
            blue.view,
            TeamView::SomeoneElseAnswering {
                winner: "Red".into()
            }
        );
    }

    #[tokio::test]
    async fn teams_in_separate_handles_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz_state.json");
        let open = |path: std::path::PathBuf| async move {
            let backend = crate::dao::round_store::FileRoundStore::open(path).await.unwrap();
            CoordinationStore::new(Arc::new(backend), RetryPolicy::new(3, Duration::ZERO))
        };
        let host = open(path.clone()).await;
        let red = open(path.clone()).await;
        let blue = open(path).await;

        register(&red, "Red").await.unwrap();
        register(&blue, "Blue").await.unwrap();
        start_round(&host).await;

        assert!(BuzzerArbiter::new(blue.clone()).try_buzz("Blue").await);
        assert!(!BuzzerArbiter::new(red.clone()).try_buzz("Red").await);

        let status = poll(&red, "Red").await.unwrap();
        assert_eq!(
            status.view,
            TeamView::SomeoneElseAnswering {
                winner: "Blue".into()
            }
        );
        assert_eq!(host.read().await.connected_teams.len(), 2);
    }

    #[tokio::test]
    async fn poller_survives_a_single_failed_health_check() {
        let (store, poller) = flaky_poller(2..3).await;
        let (tx, rx) = mpsc::channel(1);
        tx.send(()).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            poller.run(rx, |event| events.push(event)),
        )
        .await
        .unwrap();

        assert!(result.is_ok());
        assert!(events.contains(&PollerEvent::Buzzed { accepted: true }));
        assert_eq!(store.read().await.winner.as_deref(), Some("Red"));
    }

    #[tokio::test]
    async fn poller_gives_up_after_repeated_health_failures() {
        let (_store, poller) = flaky_poller(1..u32::MAX).await;
        let (_tx, rx) = mpsc::channel(1);

        let result = poller.run(rx, |_| {}).await;

        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn poller_reports_changes_and_forwards_buzzes() {
        let store = store();
        register(&store, "Red").await.unwrap();
        start_round(&store).await;
        let poller = TeamPoller::new(
            store.clone(),
            BuzzerArbiter::new(store.clone()),
            "Red".into(),
            Duration::from_millis(5),
        );
        let (tx, rx) = mpsc::channel(1);
        tx.send(()).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        poller.run(rx, |event| events.push(event)).await.unwrap();

        assert!(matches!(
            &events[0],
            PollerEvent::Status(TeamStatus { view: TeamView::BuzzAvailable, .. })
        ));
        assert!(events.contains(&PollerEvent::Buzzed { accepted: true }));
        assert_eq!(store.read().await.winner.as_deref(), Some("Red"));
    }
}
