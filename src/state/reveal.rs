//! Reveal sequence primitives: cell ordering for the grid reveal and progress
//! tracking for the fade-in variant.

use rand::{Rng, seq::SliceRandom};

/// Build a fresh reveal order: every cell of a `grid_size` × `grid_size` grid
/// exactly once, shuffled.
pub fn shuffled_order<R>(grid_size: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut order: Vec<usize> = (0..grid_size * grid_size).collect();
    order.shuffle(rng);
    order
}

/// Next cell to uncover, resuming at the length of the revealed prefix.
pub fn next_cell(order: &[usize], revealed: &[usize]) -> Option<usize> {
    order.get(revealed.len()).copied()
}

/// Whether `revealed` is exactly the first `revealed.len()` entries of `order`.
pub fn is_prefix_consistent(order: &[usize], revealed: &[usize]) -> bool {
    revealed.len() <= order.len() && order[..revealed.len()] == *revealed
}

/// Background the fade-in starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeBackground {
    /// Fade in from a white canvas.
    #[default]
    White,
    /// Fade in from a black canvas.
    Black,
}

impl FadeBackground {
    /// Channel value of the background colour.
    pub fn value(self) -> u8 {
        match self {
            FadeBackground::White => 255,
            FadeBackground::Black => 0,
        }
    }
}

/// Continuous reveal progress for the fade-in variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeProgress {
    alpha: f32,
    step: f32,
}

impl FadeProgress {
    /// Start a fade at alpha 0 advancing by `step` per tick.
    pub fn new(step: f32) -> Self {
        Self { alpha: 0.0, step }
    }

    /// Current blend factor in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Per-tick increment.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Change the increment used by subsequent ticks.
    pub fn set_step(&mut self, step: f32) {
        self.step = step;
    }

    /// Go back to a blank canvas.
    pub fn reset(&mut self) {
        self.alpha = 0.0;
    }

    /// Advance one tick, clamped at 1.0. Returns the new alpha, or `None`
    /// once the photo is already fully visible.
    pub fn advance(&mut self) -> Option<f32> {
        if self.is_complete() {
            return None;
        }
        self.alpha = (self.alpha + self.step).min(1.0);
        Some(self.alpha)
    }

    /// Whether the photo is fully visible.
    pub fn is_complete(&self) -> bool {
        self.alpha >= 1.0
    }
}
