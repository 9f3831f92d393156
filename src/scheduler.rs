//! Periodic scheduler: one base tick, three nested rates.
//!
//! ```text
//!  base tick ──┬──────────────────────────▶ input scan + publish drain
//!              │
//!              ├── ÷10  (countdown) ──────▶ blink scheduler
//!              │
//!              └── ÷100 (countdown) ──────▶ status indicator
//! ```
//!
//! Both countdowns decrement to zero and reload independently.  When
//! their periods coincide both fire within the same base tick; they touch
//! disjoint state so their relative order does not matter.

/// Base ticks per blink scheduler pass.
pub const BLINK_DIVIDER: u8 = 10;
/// Base ticks per status indicator refresh.
pub const STATUS_DIVIDER: u8 = 100;

/// Which of the slower rates fired on a given base tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fired {
    pub blink: bool,
    pub status: bool,
}

/// Countdown dividers driven by the single base tick.
#[derive(Debug, Clone)]
pub struct PeriodicScheduler {
    blink_countdown: u8,
    status_countdown: u8,
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicScheduler {
    pub fn new() -> Self {
        Self {
            blink_countdown: BLINK_DIVIDER,
            status_countdown: STATUS_DIVIDER,
        }
    }

    /// Advance one base tick and report which slower rates are due.
    pub fn tick(&mut self) -> Fired {
        Fired {
            blink: Self::count_down(&mut self.blink_countdown, BLINK_DIVIDER),
            status: Self::count_down(&mut self.status_countdown, STATUS_DIVIDER),
        }
    }

    fn count_down(counter: &mut u8, reload: u8) -> bool {
        *counter = counter.saturating_sub(1);
        if *counter == 0 {
            *counter = reload;
            true
        } else {
            false
        }
    }
}
