//! Reveal sequencing: the cell-by-cell grid reveal driven by the shared round
//! document, the local fade-in ticker, and the host poll cycle that decides
//! which of them owns the display.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info};

use crate::{
    photo::{PixelGrid, canvas::composite},
    services::{
        coordination::CoordinationStore,
        display::{DisplayFrame, DisplaySurface, FrameKind},
    },
    state::{
        SharedState,
        reveal::{is_prefix_consistent, next_cell},
        round::RoundState,
        state_machine::HostPhase,
    },
};

/// Why a reveal stopped before uncovering every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    /// A team holds the buzz lock.
    Buzzed,
    /// The host uncovered the whole photo.
    ShowAll,
    /// The round was not started (or was moved to the next photo).
    NotStarted,
    /// The round no longer accepts buzzes.
    Inactive,
    /// The order is empty, not square, or `revealed` is not a prefix of it.
    InvalidOrder,
}

/// Result of one reveal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every cell of the order is uncovered.
    Completed,
    /// The run stopped early; a later run resumes at the same cell.
    Interrupted(InterruptReason),
}

/// Reason the reveal must not advance for `round`, if any.
pub fn interrupt_reason(round: &RoundState) -> Option<InterruptReason> {
    if round.winner.is_some() {
        Some(InterruptReason::Buzzed)
    } else if round.show_all {
        Some(InterruptReason::ShowAll)
    } else if !round.game_started {
        Some(InterruptReason::NotStarted)
    } else if !round.active {
        Some(InterruptReason::Inactive)
    } else if round.grid_size().is_none() || !is_prefix_consistent(&round.order, &round.revealed) {
        Some(InterruptReason::InvalidOrder)
    } else {
        None
    }
}

/// Composite of the revealed cells of `round` over `photo`.
pub fn render_round(photo: &PixelGrid, round: &RoundState) -> DisplayFrame {
    let grid_size = round.grid_size().unwrap_or(0);
    DisplayFrame::with_pixels(
        FrameKind::Partial {
            revealed: round.revealed.len(),
            total: round.order.len(),
        },
        composite(photo, grid_size, &round.revealed),
    )
}

/// Uncover the next cell when the round allows it.
fn reveal_step(mut round: RoundState) -> RoundState {
    if interrupt_reason(&round).is_some() || round.reveal_complete() {
        return round;
    }
    if let Some(cell) = next_cell(&round.order, &round.revealed) {
        round.revealed.push(cell);
    }
    round
}

/// Run the grid reveal until every cell is uncovered or the round stops it.
///
/// The document is re-read before every step, so buzzes and host commands from
/// any participant interrupt the run within one `delay`. The store is never
/// held across the sleep.
pub async fn run_reveal(
    store: &CoordinationStore,
    photo: &PixelGrid,
    display: &dyn DisplaySurface,
    delay: Duration,
) -> RevealOutcome {
    loop {
        let round = store.read().await;
        if let Some(reason) = interrupt_reason(&round) {
            return RevealOutcome::Interrupted(reason);
        }
        if round.reveal_complete() {
            return RevealOutcome::Completed;
        }

        match store.modify(reveal_step).await {
            Some(round) if interrupt_reason(&round).is_none() => {
                debug!(
                    revealed = round.revealed.len(),
                    total = round.order.len(),
                    "revealed cell"
                );
                display.present(render_round(photo, &round));
            }
            _ => {}
        }

        sleep(delay).await;
    }
}

/// Static frame for `phase` when no reveal or fade owns the display.
pub fn static_frame(phase: HostPhase, photo: &PixelGrid, round: &RoundState) -> DisplayFrame {
    match phase {
        HostPhase::Idle => DisplayFrame::placeholder("waiting for the host to pick a photo"),
        HostPhase::Ready => DisplayFrame::with_pixels(
            FrameKind::Placeholder,
            PixelGrid::blank_like(photo),
        )
        .captioned("press start"),
        HostPhase::Revealed => DisplayFrame::with_pixels(FrameKind::Full, photo.clone()),
        HostPhase::Locked => {
            let frame = render_round(photo, round);
            match &round.winner {
                Some(winner) => frame.captioned(format!("{winner} is answering")),
                None => frame,
            }
        }
        HostPhase::Active if round.reveal_complete() => {
            render_round(photo, round).captioned("photo revealed")
        }
        HostPhase::Active => render_round(photo, round),
    }
}

/// One host poll: re-read the document, start the reveal when the round is
/// active and not held by the host, otherwise show the frame matching the
/// current phase.
pub async fn host_tick(state: &SharedState) {
    let Ok(store) = state.coordination().await else {
        return;
    };
    let round = store.read().await;
    let display = state.display();
    let mut host = state.host().lock().await;
    let phase = HostPhase::derive(&round, host.photo_selected());

    let Some(photo) = host.current_pixels() else {
        let caption = if host.deck().is_empty() {
            "no photos loaded"
        } else {
            "waiting for the host to pick a photo"
        };
        display.present(DisplayFrame::placeholder(caption));
        return;
    };

    let can_advance = interrupt_reason(&round).is_none() && !round.reveal_complete();
    if phase == HostPhase::Active && can_advance && !host.fade().is_engaged() {
        if host.is_paused() {
            host.abort_reveal();
            display.present(render_round(&photo, &round).captioned("paused"));
        } else if !host.reveal_running() {
            info!(revealed = round.revealed.len(), total = round.order.len(), "starting reveal");
            let delay = host.settings().reveal_delay;
            host.set_reveal(spawn_reveal(state.clone(), store, photo, delay));
        }
        return;
    }

    if host.reveal_running() || host.fade().is_engaged() {
        return;
    }
    display.present(static_frame(phase, &photo, &round));
}

/// Host poll cycle: tick every poll interval or as soon as a command wakes it.
pub async fn run_host_cycle(state: SharedState) {
    let interval = state.config().host_poll_interval;
    loop {
        host_tick(&state).await;
        tokio::select! {
            _ = sleep(interval) => {}
            _ = state.host_wakeup().notified() => {}
        }
    }
}

fn spawn_reveal(
    state: SharedState,
    store: CoordinationStore,
    photo: Arc<PixelGrid>,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let display = state.display();
        let outcome = run_reveal(&store, &photo, &*display, delay).await;
        info!(?outcome, "reveal stopped");
        state.wake_host();
    })
}

/// Spawn the fade ticker. It advances the host's fade session every fade tick
/// and exits once the fade is paused, stopped or complete.
pub fn spawn_fade_ticker(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tick = state.config().fade_tick;
        let display = state.display();
        loop {
            let frame = {
                let mut host = state.host().lock().await;
                let Some(photo) = host.current_pixels() else {
                    break;
                };
                host.fade_mut().tick(&photo)
            };
            let Some(frame) = frame else {
                break;
            };
            display.present(frame);
            sleep(tick).await;
        }
        debug!("fade ticker stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::RoundStateEntity,
            round_store::{MemoryRoundStore, RoundStore},
            storage::StorageResult,
        },
        photo::{PhotoDeck, deck::Photo},
        services::coordination::RetryPolicy,
        state::{AppState, round::RoundUpdate},
    };

    #[derive(Default)]
    struct RecordingDisplay {
        frames: Mutex<Vec<DisplayFrame>>,
    }

    impl RecordingDisplay {
        fn frames(&self) -> Vec<DisplayFrame> {
            self.frames.lock().unwrap().clone()
        }
    }

    impl DisplaySurface for RecordingDisplay {
        fn present(&self, frame: DisplayFrame) {
            self.frames.lock().unwrap().push(frame);
        }
    }

    /// Memory store that hands the buzz lock to "Red" right after the
    /// `trip_at`-th write lands.
    struct BuzzAfter {
        inner: MemoryRoundStore,
        writes: AtomicUsize,
        trip_at: usize,
    }

    impl RoundStore for BuzzAfter {
        fn load(&self) -> BoxFuture<'static, StorageResult<Option<RoundStateEntity>>> {
            self.inner.load()
        }

        fn replace(&self, mut round: RoundStateEntity) -> BoxFuture<'static, StorageResult<()>> {
            if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.trip_at {
                round.winner = Some("Red".into());
            }
            self.inner.replace(round)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    fn photo() -> PixelGrid {
        PixelGrid::new(4, 4, 1, (1..=16).collect()).unwrap()
    }

    fn store_over(backend: Arc<dyn RoundStore>) -> CoordinationStore {
        CoordinationStore::new(backend, RetryPolicy::new(1, Duration::ZERO))
    }

    async fn start(store: &CoordinationStore, order: Vec<usize>) {
        store
            .write(
                RoundUpdate::new()
                    .order(order)
                    .revealed(Vec::new())
                    .active(true)
                    .game_started(true),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reveal_uncovers_cells_in_order() {
        let store = store_over(Arc::new(MemoryRoundStore::new()));
        start(&store, vec![2, 0, 3, 1]).await;
        let display = RecordingDisplay::default();

        let outcome = run_reveal(&store, &photo(), &display, Duration::ZERO).await;

        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(store.read().await.revealed, vec![2, 0, 3, 1]);
        let frames = display.frames();
        assert_eq!(frames.len(), 4);
        assert_eq!(
            frames[2].pixels.as_deref(),
            Some(&composite(&photo(), 2, &[2, 0, 3]))
        );
        assert_eq!(frames[3].kind, FrameKind::Partial { revealed: 4, total: 4 });
    }

    #[tokio::test]
    async fn winner_stops_reveal_before_any_step() {
        let store = store_over(Arc::new(MemoryRoundStore::new()));
        start(&store, vec![2, 0, 3, 1]).await;
        store.write(RoundUpdate::new().winner(Some("Blue".into()))).await.unwrap();
        let display = RecordingDisplay::default();

        let outcome = run_reveal(&store, &photo(), &display, Duration::ZERO).await;

        assert_eq!(outcome, RevealOutcome::Interrupted(InterruptReason::Buzzed));
        assert!(store.read().await.revealed.is_empty());
        assert!(display.frames().is_empty());
    }

    #[tokio::test]
    async fn interrupted_reveal_resumes_at_next_cell() {
        let order = vec![3, 1, 0, 2];
        let uninterrupted = {
            let store = store_over(Arc::new(MemoryRoundStore::new()));
            start(&store, order.clone()).await;
            let display = RecordingDisplay::default();
            run_reveal(&store, &photo(), &display, Duration::ZERO).await;
            display.frames().pop().unwrap()
        };

        // the start write is #1, so the buzz lands with the second cell
        let backend = Arc::new(BuzzAfter {
            inner: MemoryRoundStore::new(),
            writes: AtomicUsize::new(0),
            trip_at: 3,
        });
        let store = store_over(backend);
        start(&store, order.clone()).await;
        let display = RecordingDisplay::default();

        let outcome = run_reveal(&store, &photo(), &display, Duration::ZERO).await;
        assert_eq!(outcome, RevealOutcome::Interrupted(InterruptReason::Buzzed));
        assert_eq!(store.read().await.revealed, vec![3, 1]);

        store.write(RoundUpdate::new().winner(None)).await.unwrap();
        let outcome = run_reveal(&store, &photo(), &display, Duration::ZERO).await;

        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(store.read().await.revealed, order);
        assert_eq!(display.frames().pop().unwrap(), uninterrupted);
    }

    #[test]
    fn interrupt_reasons_follow_round_flags() {
        let running = RoundState {
            order: vec![0, 1, 2, 3],
            active: true,
            game_started: true,
            ..RoundState::default()
        };
        assert_eq!(interrupt_reason(&running), None);

        let show_all = RoundState {
            show_all: true,
            ..running.clone()
        };
        assert_eq!(interrupt_reason(&show_all), Some(InterruptReason::ShowAll));

        let next_photo = RoundState {
            game_started: false,
            ..running.clone()
        };
        assert_eq!(interrupt_reason(&next_photo), Some(InterruptReason::NotStarted));

        let skipped = RoundState {
            revealed: vec![1],
            ..running
        };
        assert_eq!(interrupt_reason(&skipped), Some(InterruptReason::InvalidOrder));
    }

    #[test]
    fn static_frames_match_phase() {
        let round = RoundState {
            order: vec![2, 0, 3, 1],
            revealed: vec![2],
            winner: Some("Red".into()),
            ..RoundState::default()
        };

        let ready = static_frame(HostPhase::Ready, &photo(), &round);
        assert_eq!(ready.caption.as_deref(), Some("press start"));
        assert!(ready.pixels.unwrap().data().iter().all(|&v| v == 0));

        let locked = static_frame(HostPhase::Locked, &photo(), &round);
        assert_eq!(locked.caption.as_deref(), Some("Red is answering"));

        let revealed = static_frame(HostPhase::Revealed, &photo(), &round);
        assert_eq!(revealed.pixels.as_deref(), Some(&photo()));

        let done = RoundState {
            revealed: vec![2, 0, 3, 1],
            winner: None,
            ..round
        };
        let finished = static_frame(HostPhase::Active, &photo(), &done);
        assert_eq!(finished.caption.as_deref(), Some("photo revealed"));
    }

    #[tokio::test]
    async fn paused_round_holds_the_reveal_until_resumed() {
        let deck = PhotoDeck::from_photos(vec![Photo::new("a.pgm", photo())]);
        let state = AppState::new(AppConfig::default(), deck);
        state
            .install_round_store(Arc::new(MemoryRoundStore::new()))
            .await;
        let store = state.coordination().await.unwrap();
        start(&store, vec![2, 0, 3, 1]).await;
        {
            let mut host = state.host().lock().await;
            host.advance_cursor();
            host.set_paused(true);
        }

        host_tick(&state).await;

        let frame = state.display().latest().unwrap();
        assert_eq!(frame.caption.as_deref(), Some("paused"));
        assert_eq!(frame.kind, FrameKind::Partial { revealed: 0, total: 4 });
        assert!(!state.host().lock().await.reveal_running());

        state.host().lock().await.set_paused(false);
        host_tick(&state).await;

        let mut host = state.host().lock().await;
        assert!(host.reveal_running());
        host.abort_reveal();
    }
}
