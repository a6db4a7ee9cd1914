//! Input buffer timers.
//!
//! One timer primitive serves two opposite semantics:
//!
//! - "did the player act within the last N seconds": jump buffer, coyote
//!   grace, wall-jump buffer; checked once via [`BufferTimer::consume_if_buffered`],
//!   which also force-expires the timer so a press is never honored twice.
//! - "has it been at least N seconds since leaving this mode": the wall-run
//!   reentry cooldown; checked repeatedly via [`BufferTimer::is_elapsed`]
//!   without consuming.
//!
//! Both are elapsed-vs-window comparisons on the same struct, so there is a
//! single piece of timer machinery to get right.

use bevy::prelude::*;

use crate::config::ControllerConfig;

/// A count-up buffer timer.
///
/// `elapsed` counts up from 0 toward `window`; the buffer is "fresh" while
/// `elapsed < window`. Timers are constructed expired so nothing fires at
/// startup before the triggering event has ever happened.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct BufferTimer {
    elapsed: f32,
    window: f32,
}

impl BufferTimer {
    /// Create a timer with the given window, already expired.
    pub fn expired(window: f32) -> Self {
        Self {
            elapsed: window,
            window,
        }
    }

    /// Restart the countdown from zero. Called on the triggering event
    /// (button press, ledge loss, wall-mode exit).
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Advance the timer, clamped at the window.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.window);
    }

    /// Consume the buffer: returns true and force-expires the timer iff the
    /// triggering event is still fresh. A consumed buffer cannot fire again
    /// until [`reset`](Self::reset).
    pub fn consume_if_buffered(&mut self) -> bool {
        if self.elapsed < self.window {
            self.elapsed = self.window;
            true
        } else {
            false
        }
    }

    /// Cooldown query: has the full window passed since the last reset?
    /// Does not consume.
    pub fn is_elapsed(&self) -> bool {
        self.elapsed >= self.window
    }

    /// Replace the window (config hot reload). Elapsed is clamped into the
    /// new window so a shrunk window reads as expired, never as fresh.
    pub fn set_window(&mut self, window: f32) {
        if (self.window - window).abs() > f32::EPSILON {
            // An expired timer stays expired across the resize.
            if self.is_elapsed() {
                self.elapsed = window;
            }
            self.window = window;
            self.elapsed = self.elapsed.min(self.window);
        }
    }
}

/// The four buffered-action timers of one controller instance.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ActionBuffers {
    /// Early jump press, honored on landing.
    pub jump: BufferTimer,
    /// Coyote grace after walking off a ledge.
    pub grace: BufferTimer,
    /// Wall-run reentry cooldown after exiting a wall mode.
    pub wall_run: BufferTimer,
    /// Wall-jump window opened on first wall contact.
    pub wall_jump: BufferTimer,
}

impl ActionBuffers {
    /// Create buffers with windows taken from the config, all expired.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            jump: BufferTimer::expired(config.jumping.jump_buffer_time),
            grace: BufferTimer::expired(config.jumping.grace_time),
            wall_run: BufferTimer::expired(config.wall_run.reentry_time),
            wall_jump: BufferTimer::expired(config.wall_run.wall_jump_time),
        }
    }

    /// Advance all four timers by one tick.
    pub fn tick(&mut self, dt: f32) {
        self.jump.tick(dt);
        self.grace.tick(dt);
        self.wall_run.tick(dt);
        self.wall_jump.tick(dt);
    }

    /// Pick up hot-reloaded buffer windows from the config.
    pub fn sync_windows(&mut self, config: &ControllerConfig) {
        self.jump.set_window(config.jumping.jump_buffer_time);
        self.grace.set_window(config.jumping.grace_time);
        self.wall_run.set_window(config.wall_run.reentry_time);
        self.wall_jump.set_window(config.wall_run.wall_jump_time);
    }
}

impl Default for ActionBuffers {
    fn default() -> Self {
        Self::new(&ControllerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_expired() {
        let mut timer = BufferTimer::expired(0.1);
        assert!(timer.is_elapsed());
        assert!(!timer.consume_if_buffered());
    }

    #[test]
    fn fresh_within_window() {
        let mut timer = BufferTimer::expired(0.1);
        timer.reset();
        timer.tick(0.05);
        assert!(!timer.is_elapsed());
        assert!(timer.consume_if_buffered());
    }

    #[test]
    fn expires_at_window() {
        let mut timer = BufferTimer::expired(0.1);
        timer.reset();
        timer.tick(0.1);
        assert!(timer.is_elapsed());
        assert!(!timer.consume_if_buffered());
    }

    #[test]
    fn consume_prevents_double_fire() {
        let mut timer = BufferTimer::expired(0.1);
        timer.reset();
        assert!(timer.consume_if_buffered());
        // Second consumption within the same window must fail.
        assert!(!timer.consume_if_buffered());
        assert!(timer.is_elapsed());
    }

    #[test]
    fn reset_rearms_after_consumption() {
        let mut timer = BufferTimer::expired(0.1);
        timer.reset();
        assert!(timer.consume_if_buffered());
        timer.reset();
        assert!(timer.consume_if_buffered());
    }

    #[test]
    fn tick_clamps_at_window() {
        let mut timer = BufferTimer::expired(0.1);
        timer.reset();
        for _ in 0..100 {
            timer.tick(1.0);
        }
        assert!(timer.is_elapsed());
    }

    #[test]
    fn zero_window_never_buffers() {
        let mut timer = BufferTimer::expired(0.0);
        timer.reset();
        assert!(!timer.consume_if_buffered());
        assert!(timer.is_elapsed());
    }

    #[test]
    fn window_resize_keeps_expired_expired() {
        let mut timer = BufferTimer::expired(0.1);
        timer.tick(1.0);
        assert!(timer.is_elapsed());
        timer.set_window(0.5);
        assert!(timer.is_elapsed());
        assert!(!timer.consume_if_buffered());
    }

    #[test]
    fn window_resize_preserves_fresh_elapsed() {
        let mut timer = BufferTimer::expired(0.2);
        timer.reset();
        timer.tick(0.05);
        timer.set_window(0.1);
        // Still fresh: 0.05 elapsed of a 0.1 window.
        assert!(timer.consume_if_buffered());
    }

    #[test]
    fn action_buffers_tick_all() {
        let mut buffers = ActionBuffers::default();
        buffers.jump.reset();
        buffers.grace.reset();
        buffers.tick(10.0);
        assert!(buffers.jump.is_elapsed());
        assert!(buffers.grace.is_elapsed());
        assert!(buffers.wall_run.is_elapsed());
        assert!(buffers.wall_jump.is_elapsed());
    }
}
