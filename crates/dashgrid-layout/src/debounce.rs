#![forbid(unsafe_code)]

//! Trailing-edge debounce with an explicit busy phase.
//!
//! ```text
//! Idle --request--> Pending{deadline} --poll(now >= deadline)--> Running --complete--> Idle
//!                       ^  request: keeps deadline                 | request: sets rerun
//!                       +------------- complete (rerun) -----------+
//! ```
//!
//! The first request in a quiet period opens a window; later requests inside
//! the window wait for the existing deadline instead of pushing it out. A
//! request that arrives while the guarded work is running schedules exactly
//! one follow-up window once it completes. Time is supplied by the caller.

use web_time::{Duration, Instant};

/// Debouncer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending { deadline: Instant },
    Running { rerun: bool },
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    phase: DebouncePhase,
    fired: u64,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: DebouncePhase::Idle,
            fired: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> DebouncePhase {
        self.phase
    }

    /// Number of times the guarded work was released by [`poll`](Self::poll).
    #[inline]
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.phase, DebouncePhase::Pending { .. })
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, DebouncePhase::Running { .. })
    }

    /// When the pending window closes, if one is open.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            DebouncePhase::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Ask for the guarded work to run. Returns `true` if this call opened a
    /// new window.
    pub fn request(&mut self, now: Instant) -> bool {
        match self.phase {
            DebouncePhase::Idle => {
                self.phase = DebouncePhase::Pending {
                    deadline: now + self.window,
                };
                true
            }
            DebouncePhase::Pending { .. } => false,
            DebouncePhase::Running { .. } => {
                self.phase = DebouncePhase::Running { rerun: true };
                false
            }
        }
    }

    /// Returns `true` if the window has closed; the debouncer is then busy
    /// until [`complete`](Self::complete) is called.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.phase {
            DebouncePhase::Pending { deadline } if now >= deadline => {
                self.phase = DebouncePhase::Running { rerun: false };
                self.fired = self.fired.saturating_add(1);
                true
            }
            _ => false,
        }
    }

    /// Mark the guarded work finished.
    pub fn complete(&mut self, now: Instant) {
        if let DebouncePhase::Running { rerun } = self.phase {
            self.phase = if rerun {
                DebouncePhase::Pending {
                    deadline: now + self.window,
                }
            } else {
                DebouncePhase::Idle
            };
        }
    }

    /// Drop any pending window. Used when the owner is torn down.
    pub fn reset(&mut self) {
        self.phase = DebouncePhase::Idle;
    }
}
