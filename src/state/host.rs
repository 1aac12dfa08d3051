//! Host-local presentation state: the photo deck and cursor, reveal settings,
//! the running reveal task and the fade-in session. None of this is shared
//! with teams.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    photo::{PhotoDeck, PixelGrid, canvas::blend, deck::Photo},
    services::display::{DisplayFrame, FrameKind},
    state::reveal::{FadeBackground, FadeProgress},
};

/// Smallest accepted grid size.
pub const MIN_GRID_SIZE: usize = 4;
/// Largest accepted grid size.
pub const MAX_GRID_SIZE: usize = 30;
/// Shortest accepted delay between two revealed cells.
pub const MIN_REVEAL_DELAY: Duration = Duration::from_millis(50);
/// Longest accepted delay between two revealed cells.
pub const MAX_REVEAL_DELAY: Duration = Duration::from_secs(2);
/// Smallest accepted fade increment.
pub const MIN_FADE_STEP: f32 = 0.005;
/// Largest accepted fade increment.
pub const MAX_FADE_STEP: f32 = 0.1;

/// Grid reveal tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealSettings {
    /// Cells per side used for the next round start.
    pub grid_size: usize,
    /// Pause between two uncovered cells.
    pub reveal_delay: Duration,
}

impl RevealSettings {
    /// Clamp both values into their accepted ranges.
    pub fn clamped(grid_size: usize, reveal_delay: Duration) -> Self {
        Self {
            grid_size: grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            reveal_delay: reveal_delay.clamp(MIN_REVEAL_DELAY, MAX_REVEAL_DELAY),
        }
    }
}

/// Fade-in presentation state.
#[derive(Debug)]
pub struct FadeSession {
    progress: FadeProgress,
    background: FadeBackground,
    playing: bool,
    ticker: Option<JoinHandle<()>>,
}

impl FadeSession {
    /// Stopped fade with the given increment and background.
    pub fn new(step: f32, background: FadeBackground) -> Self {
        Self {
            progress: FadeProgress::new(step.clamp(MIN_FADE_STEP, MAX_FADE_STEP)),
            background,
            playing: false,
            ticker: None,
        }
    }

    /// Whether ticks currently advance the fade.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the fade owns the display (playing, or paused part-way).
    pub fn is_engaged(&self) -> bool {
        self.playing || self.progress.alpha() > 0.0
    }

    /// Current blend factor.
    pub fn alpha(&self) -> f32 {
        self.progress.alpha()
    }

    /// Current increment.
    pub fn step(&self) -> f32 {
        self.progress.step()
    }

    /// Current background.
    pub fn background(&self) -> FadeBackground {
        self.background
    }

    /// Restart from a blank canvas and play.
    pub fn start(&mut self) {
        self.progress.reset();
        self.playing = true;
    }

    /// Pause a playing fade or resume a paused one. Returns the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.playing = !self.playing && !self.progress.is_complete();
        self.playing
    }

    /// Stop and go back to a blank canvas.
    pub fn stop(&mut self) {
        self.playing = false;
        self.progress.reset();
    }

    /// Change the increment, clamped to its accepted range.
    pub fn set_step(&mut self, step: f32) {
        self.progress.set_step(step.clamp(MIN_FADE_STEP, MAX_FADE_STEP));
    }

    /// Change the background colour.
    pub fn set_background(&mut self, background: FadeBackground) {
        self.background = background;
    }

    /// Whether a ticker task is alive.
    pub fn ticker_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Keep the handle of a freshly spawned ticker.
    pub fn set_ticker(&mut self, ticker: JoinHandle<()>) {
        self.ticker = Some(ticker);
    }

    /// Advance one tick and render it over `photo`. Returns `None` once the
    /// fade is paused, stopped or finished; reaching full opacity stops it.
    pub fn tick(&mut self, photo: &PixelGrid) -> Option<DisplayFrame> {
        if !self.playing {
            return None;
        }
        let Some(alpha) = self.progress.advance() else {
            self.playing = false;
            return None;
        };
        if self.progress.is_complete() {
            self.playing = false;
        }
        Some(self.render(photo, alpha))
    }

    /// Render the current alpha over `photo` without advancing.
    pub fn frame(&self, photo: &PixelGrid) -> DisplayFrame {
        self.render(photo, self.progress.alpha())
    }

    fn render(&self, photo: &PixelGrid, alpha: f32) -> DisplayFrame {
        DisplayFrame::with_pixels(
            FrameKind::Fade { alpha },
            blend(photo, self.background.value(), alpha),
        )
    }
}

/// Presentation state owned by the host session.
pub struct HostSession {
    deck: PhotoDeck,
    cursor: Option<usize>,
    settings: RevealSettings,
    reveal: Option<JoinHandle<()>>,
    paused: bool,
    fade: FadeSession,
}

impl HostSession {
    /// Session over `deck` with no photo selected yet.
    pub fn new(deck: PhotoDeck, settings: RevealSettings, fade: FadeSession) -> Self {
        Self {
            deck,
            cursor: None,
            settings,
            reveal: None,
            paused: false,
            fade,
        }
    }

    /// Loaded photos.
    pub fn deck(&self) -> &PhotoDeck {
        &self.deck
    }

    /// Swap the deck, keeping the cursor when it still points at a photo.
    pub fn replace_deck(&mut self, deck: PhotoDeck) {
        self.cursor = self.cursor.filter(|index| *index < deck.len());
        self.deck = deck;
    }

    /// Index of the selected photo.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether a photo is selected.
    pub fn photo_selected(&self) -> bool {
        self.current_photo().is_some()
    }

    /// Selected photo.
    pub fn current_photo(&self) -> Option<&Photo> {
        self.cursor.and_then(|index| self.deck.get(index))
    }

    /// Pixels of the selected photo.
    pub fn current_pixels(&self) -> Option<Arc<PixelGrid>> {
        self.current_photo().map(Photo::pixels)
    }

    /// Select the next photo, wrapping around; the first call selects the
    /// first photo. Returns the new index, `None` for an empty deck.
    pub fn advance_cursor(&mut self) -> Option<usize> {
        if self.deck.is_empty() {
            self.cursor = None;
            return None;
        }
        let next = match self.cursor {
            Some(index) => (index + 1) % self.deck.len(),
            None => 0,
        };
        self.cursor = Some(next);
        Some(next)
    }

    /// Forget the selection.
    pub fn clear_selection(&mut self) {
        self.cursor = None;
    }

    /// Current reveal settings.
    pub fn settings(&self) -> RevealSettings {
        self.settings
    }

    /// Replace the reveal settings. The grid size applies from the next start.
    pub fn set_settings(&mut self, settings: RevealSettings) {
        self.settings = settings;
    }

    /// Whether the reveal task is alive.
    pub fn reveal_running(&self) -> bool {
        self.reveal.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Keep the handle of a freshly spawned reveal task.
    pub fn set_reveal(&mut self, task: JoinHandle<()>) {
        self.reveal = Some(task);
    }

    /// Abort the reveal task, if any.
    pub fn abort_reveal(&mut self) {
        if let Some(task) = self.reveal.take() {
            task.abort();
        }
    }

    /// Whether the host holds the grid reveal.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Hold or release the grid reveal. Holding aborts the running task; the
    /// next poll after release resumes at the next cell of the order.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.abort_reveal();
        }
    }

    /// Flip the hold on the grid reveal. Returns the new state.
    pub fn toggle_reveal_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// Fade-in state.
    pub fn fade(&self) -> &FadeSession {
        &self.fade
    }

    /// Mutable fade-in state.
    pub fn fade_mut(&mut self) -> &mut FadeSession {
        &mut self.fade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(count: usize) -> PhotoDeck {
        PhotoDeck::from_photos(
            (0..count)
                .map(|i| {
                    Photo::new(
                        format!("{i}.pgm"),
                        PixelGrid::new(1, 1, 1, vec![i as u8]).unwrap(),
                    )
                })
                .collect(),
        )
    }

    fn session(count: usize) -> HostSession {
        HostSession::new(
            deck(count),
            RevealSettings::clamped(10, Duration::from_millis(300)),
            FadeSession::new(0.02, FadeBackground::White),
        )
    }

    #[test]
    fn cursor_starts_unselected_and_wraps() {
        let mut host = session(2);
        assert!(!host.photo_selected());
        assert_eq!(host.advance_cursor(), Some(0));
        assert_eq!(host.advance_cursor(), Some(1));
        assert_eq!(host.advance_cursor(), Some(0));
        assert_eq!(host.current_photo().unwrap().name(), "0.pgm");
    }

    #[test]
    fn empty_deck_never_selects() {
        let mut host = session(0);
        assert_eq!(host.advance_cursor(), None);
        assert!(!host.photo_selected());
    }

    #[test]
    fn reload_drops_cursor_past_the_end() {
        let mut host = session(3);
        host.advance_cursor();
        host.advance_cursor();
        host.advance_cursor();
        host.replace_deck(deck(2));
        assert_eq!(host.cursor(), None);
    }

    #[tokio::test]
    async fn pausing_aborts_the_reveal_task() {
        let mut host = session(1);
        host.set_reveal(tokio::spawn(std::future::pending()));
        assert!(host.reveal_running());

        assert!(host.toggle_reveal_pause());
        assert!(host.is_paused());
        assert!(!host.reveal_running());

        assert!(!host.toggle_reveal_pause());
        assert!(!host.is_paused());
    }

    #[test]
    fn settings_are_clamped() {
        let settings = RevealSettings::clamped(2, Duration::from_secs(9));
        assert_eq!(settings.grid_size, MIN_GRID_SIZE);
        assert_eq!(settings.reveal_delay, MAX_REVEAL_DELAY);
    }

    #[test]
    fn fade_plays_to_completion_then_stops() {
        let photo = PixelGrid::new(1, 1, 1, vec![0]).unwrap();
        let mut fade = FadeSession::new(0.1, FadeBackground::White);
        assert!(fade.tick(&photo).is_none());

        fade.start();
        let mut frames = 0;
        while let Some(frame) = fade.tick(&photo) {
            frames += 1;
            assert!(matches!(frame.kind, FrameKind::Fade { .. }));
        }
        assert!(frames >= 10);
        assert!(!fade.is_playing());
        assert_eq!(fade.frame(&photo).pixels.unwrap().data(), &[0]);

        assert!(!fade.toggle_pause());
        fade.stop();
        assert!(!fade.is_engaged());
    }

    #[test]
    fn fade_pause_toggles() {
        let mut fade = FadeSession::new(0.5, FadeBackground::Black);
        fade.start();
        assert!(!fade.toggle_pause());
        assert!(fade.toggle_pause());
        fade.set_step(5.0);
        assert_eq!(fade.step(), MAX_FADE_STEP);
    }
}
