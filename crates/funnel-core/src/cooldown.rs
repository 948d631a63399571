//! Countdown used to throttle repeated actions.
//!
//! The timer has no clock of its own: an external scheduler (an interval in
//! the host, or a test) calls [`CooldownTimer::tick`] once per second.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CooldownTimer {
    remaining: u32,
    ceiling: u32,
}

impl CooldownTimer {
    pub fn new(ceiling: u32) -> Self {
        Self {
            remaining: 0,
            ceiling,
        }
    }

    /// Reset to the ceiling. Returns false, leaving the counter untouched,
    /// while the previous countdown is still running.
    pub fn try_start(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.remaining = self.ceiling;
        true
    }

    /// Advance by one second. Never goes below zero.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}
