//! Asymmetric per-output blink scheduler.
//!
//! Each blinking output carries a pattern byte packing four 2-bit fields:
//!
//! ```text
//!   bit  7 6 │ 5 4 │ 3 2 │ 1 0
//!        hi  │ hi  │ lo  │ lo
//!        idx │ mul │ idx │ mul
//! ```
//!
//! Each pair decodes to `BLINK_TIMEOUTS[idx] * (mul + 1)` scheduler ticks
//! (100 ms each at the default base tick), so 100 ms to 3 s.  When a
//! phase ends, the pair matching the level the output is *leaving* is
//! decoded and becomes the length of the phase being entered: the high
//! pair times the low phase that follows a high level, and vice versa.
//! A decoded duration of exactly one tick (`idx == 0, mul == 0`) means
//! "hold this level": the output is never toggled out of it.  Pattern `0`
//! forces the output off.

use heapless::Vec;
use log::trace;

use crate::app::ports::GpioPort;
use crate::config::{MAX_OUTPUTS, OutputConfig};
use crate::error::{Error, Result};

use super::outputs::{output_is_on, set_output};

/// Phase timeout steps in scheduler ticks.
pub const BLINK_TIMEOUTS: [u8; 4] = [1, 5, 25, 30];

/// Phase duration that means "never leave this level".
const HOLD: u8 = 1;

// ---------------------------------------------------------------------------
// Pattern byte
// ---------------------------------------------------------------------------

/// Decoded view of a blink pattern byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern(pub u8);

impl BlinkPattern {
    pub const OFF: Self = Self(0);

    pub fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Duration decoded from the high pair; applied when leaving high.
    pub fn high_ticks(self) -> u8 {
        Self::duration((self.0 >> 6) & 0b11, (self.0 >> 4) & 0b11)
    }

    /// Duration decoded from the low pair; applied when leaving low.
    pub fn low_ticks(self) -> u8 {
        Self::duration((self.0 >> 2) & 0b11, self.0 & 0b11)
    }

    fn duration(timeout_idx: u8, multiplier: u8) -> u8 {
        BLINK_TIMEOUTS[usize::from(timeout_idx)] * (multiplier + 1)
    }
}

// ---------------------------------------------------------------------------
// Per-output state
// ---------------------------------------------------------------------------

/// Mutable blink state of one output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputState {
    /// Blink pattern byte; `0` = forced off.
    pub pattern: u8,
    /// Scheduler ticks remaining in the current phase.
    pub timer: u8,
}

/// Blink state for every configured output, indexed like the config.
#[derive(Debug, Clone)]
pub struct BlinkScheduler {
    states: Vec<OutputState, MAX_OUTPUTS>,
}

impl BlinkScheduler {
    /// One zeroed state per configured output.
    pub fn new(count: usize) -> Result<Self> {
        let mut states = Vec::new();
        states
            .resize_default(count)
            .map_err(|()| Error::Config("more outputs than the blink scheduler holds"))?;
        Ok(Self { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<OutputState> {
        self.states.get(index).copied()
    }

    /// Store a new pattern and force re-evaluation on the next pass.
    pub fn set_pattern(&mut self, index: usize, pattern: u8) {
        if let Some(s) = self.states.get_mut(index) {
            s.pattern = pattern;
            s.timer = 0;
        }
    }

    /// One scheduler pass over every blink-enabled output.
    pub fn tick(&mut self, configs: &[OutputConfig], gpio: &mut impl GpioPort) {
        for (i, (cfg, state)) in configs.iter().zip(self.states.iter_mut()).enumerate() {
            if !cfg.blink {
                continue;
            }

            let pattern = BlinkPattern(state.pattern);
            if pattern.is_off() {
                set_output(gpio, cfg, false);
                continue;
            }

            state.timer = state.timer.saturating_sub(1);
            if state.timer != 0 {
                continue;
            }

            let high = output_is_on(&*gpio, cfg);
            let duration = if high {
                pattern.high_ticks()
            } else {
                pattern.low_ticks()
            };
            if duration == HOLD {
                continue;
            }

            state.timer = duration;
            set_output(gpio, cfg, !high);
            trace!("blink[{}]: {} for {} ticks", i, if high { "low" } else { "high" }, duration);
        }
    }
}
