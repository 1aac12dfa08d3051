//! Display boundary. The game only hands finished frames to a
//! [`DisplaySurface`]; how they reach a screen is up to the surface.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::{
    dto::sse::{FrameEvent, FrameKindDto, ServerEvent, SystemStatus},
    photo::PixelGrid,
    state::SseHub,
};

/// What a frame shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameKind {
    /// Text-only or blank frame.
    Placeholder,
    /// Grid reveal with `revealed` of `total` cells uncovered.
    Partial {
        /// Uncovered cells.
        revealed: usize,
        /// Cells in the grid.
        total: usize,
    },
    /// Whole photo.
    Full,
    /// Fade-in frame at `alpha`.
    Fade {
        /// Blend factor.
        alpha: f32,
    },
}

/// One frame handed to the display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    /// Frame category.
    pub kind: FrameKind,
    /// Text shown with the frame.
    pub caption: Option<String>,
    /// Pixels, absent for text-only frames.
    pub pixels: Option<Arc<PixelGrid>>,
}

impl DisplayFrame {
    /// Text-only frame.
    pub fn placeholder(caption: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Placeholder,
            caption: Some(caption.into()),
            pixels: None,
        }
    }

    /// Frame carrying pixels.
    pub fn with_pixels(kind: FrameKind, pixels: PixelGrid) -> Self {
        Self {
            kind,
            caption: None,
            pixels: Some(Arc::new(pixels)),
        }
    }

    /// Attach a caption.
    pub fn captioned(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Sink for rendered frames.
pub trait DisplaySurface: Send + Sync {
    /// Show `frame`, replacing whatever was shown before.
    fn present(&self, frame: DisplayFrame);
}

/// Display keeping the latest frame and announcing changes on an SSE hub.
///
/// Presenting the frame that is already shown is a no-op, so callers may
/// re-present static frames on every poll.
pub struct BroadcastDisplay {
    latest: watch::Sender<Option<Arc<DisplayFrame>>>,
    hub: SseHub,
    sequence: AtomicU64,
}

impl BroadcastDisplay {
    /// Create a display whose event channel buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (latest, _rx) = watch::channel(None);
        Self {
            latest,
            hub: SseHub::new(capacity),
            sequence: AtomicU64::new(0),
        }
    }

    /// Frame currently shown.
    pub fn latest(&self) -> Option<Arc<DisplayFrame>> {
        self.latest.borrow().clone()
    }

    /// Subscribe to `frame` events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.hub.subscribe()
    }

    /// Number of frames announced so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Tell display subscribers that the backend entered or left degraded mode.
    pub fn announce_status(&self, degraded: bool) {
        match ServerEvent::json(Some("system".to_string()), &SystemStatus { degraded }) {
            Ok(event) => self.hub.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise system event"),
        }
    }

    fn announce(&self, frame: &DisplayFrame) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let payload = frame_event(sequence, frame);
        match ServerEvent::json(Some("frame".to_string()), &payload) {
            Ok(event) => self.hub.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise frame event"),
        }
    }
}

impl DisplaySurface for BroadcastDisplay {
    fn present(&self, frame: DisplayFrame) {
        let changed = self.latest.send_if_modified(|current| {
            if current.as_deref() == Some(&frame) {
                return false;
            }
            *current = Some(Arc::new(frame.clone()));
            true
        });

        if changed {
            self.announce(&frame);
        }
    }
}

fn frame_event(sequence: u64, frame: &DisplayFrame) -> FrameEvent {
    let (kind, revealed, total, alpha) = match frame.kind {
        FrameKind::Placeholder => (FrameKindDto::Placeholder, None, None, None),
        FrameKind::Partial { revealed, total } => {
            (FrameKindDto::Partial, Some(revealed), Some(total), None)
        }
        FrameKind::Full => (FrameKindDto::Full, None, None, None),
        FrameKind::Fade { alpha } => (FrameKindDto::Fade, None, None, Some(alpha)),
    };

    FrameEvent {
        sequence,
        kind,
        caption: frame.caption.clone(),
        revealed,
        total,
        alpha,
        width: frame.pixels.as_ref().map(|pixels| pixels.width()),
        height: frame.pixels.as_ref().map(|pixels| pixels.height()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_frames_are_announced_once() {
        let display = BroadcastDisplay::new(8);
        let mut events = display.subscribe();

        display.present(DisplayFrame::placeholder("press start"));
        display.present(DisplayFrame::placeholder("press start"));
        display.present(DisplayFrame::placeholder("waiting for a photo"));

        assert_eq!(display.sequence(), 2);
        let first = events.try_recv().unwrap();
        assert_eq!(first.event.as_deref(), Some("frame"));
        assert!(first.data.contains("\"caption\":\"press start\""));
        assert!(events.try_recv().unwrap().data.contains("waiting for a photo"));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn latest_frame_keeps_pixels() {
        let display = BroadcastDisplay::new(8);
        let pixels = PixelGrid::new(1, 1, 3, vec![1, 2, 3]).unwrap();

        display.present(DisplayFrame::with_pixels(FrameKind::Full, pixels.clone()));

        let latest = display.latest().unwrap();
        assert_eq!(latest.kind, FrameKind::Full);
        assert_eq!(latest.pixels.as_deref(), Some(&pixels));
    }
}
