//! Frame delta to sub-step conversion
//!
//! Each animation frame the wall-clock delta is clamped and split into
//! equal sub-steps short enough that nothing moves far between collision
//! checks. Rendering happens once per frame, after the last sub-step.

use crate::consts::*;
use crate::sim::{GameState, TickInput, tick};

/// Sub-step count and length for a raw frame delta
pub fn substep_plan(dt: f32) -> (u32, f32) {
    // NaN (clock hiccups) counts as no time at all
    let dt = if dt.is_nan() { 0.0 } else { dt.clamp(0.0, MAX_FRAME_DT) };
    let steps = 1 + (dt / SUBSTEP_SPAN).ceil() as u32;
    (steps, dt / steps as f32)
}

/// Edge trigger for a held key: one action per press
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionLatch {
    held: bool,
    pending: bool,
}

impl ActionLatch {
    /// Key went down (repeats while held are ignored)
    pub fn press(&mut self) {
        if !self.held {
            self.held = true;
            self.pending = true;
        }
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    /// Consume the pending action, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

/// Turns wall-clock frame times into sub-stepped ticks
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    last_frame: Option<f64>,
    pub primary: ActionLatch,
    pub idle_mode: bool,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one animation frame at wall-clock `now` (seconds); returns the
    /// number of sub-steps taken
    pub fn frame(&mut self, state: &mut GameState, now: f64) -> u32 {
        let dt = self.last_frame.map_or(0.0, |last| (now - last) as f32);
        self.last_frame = Some(now);
        self.advance(state, dt)
    }

    /// Advance by an explicit frame delta
    pub fn advance(&mut self, state: &mut GameState, dt: f32) -> u32 {
        let (steps, step_dt) = substep_plan(dt);
        let mut input = TickInput {
            primary: self.primary.take(),
            idle_mode: self.idle_mode,
        };
        for _ in 0..steps {
            tick(state, &input, step_dt);
            // Clear one-shot inputs after processing
            input.primary = false;
        }
        steps
    }
}
