//! Emergency interlock.
//!
//! Tripped by an emergency-switch edge while the supervisor cannot be
//! reached, so a person at the switch still has local control over the
//! room when the automation above this node is gone.
//!
//! ## Trip sequence
//!
//! 1. Every lighting channel is zeroed.
//! 2. `any_on` is sampled across the toggle group.
//! 3. Every toggle-group output is set to `!any_on`: one unified group
//!    toggle (anything on → everything off, all off → everything on).
//! 4. Every zero-group output is forced off.

use log::warn;

use crate::app::ports::{GpioPort, LightingPort};
use crate::config::OutputConfig;
use crate::drivers::outputs::{output_is_on, set_output};

/// Result of one interlock trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockTrip {
    /// Whether any toggle-group output was on before the trip.
    pub any_was_on: bool,
    /// Outputs in the toggle group.
    pub toggled: usize,
    /// Outputs in the zero group.
    pub zeroed: usize,
}

impl InterlockTrip {
    /// State the toggle group was driven to.
    pub fn toggle_group_on(&self) -> bool {
        !self.any_was_on
    }
}

/// Run the trip sequence against the hardware.
pub fn trip(outputs: &[OutputConfig], hw: &mut (impl GpioPort + LightingPort)) -> InterlockTrip {
    hw.clear_channels();

    let any_was_on = outputs
        .iter()
        .filter(|o| o.emergency_toggle)
        .any(|o| output_is_on(&*hw, o));

    let mut toggled = 0;
    for o in outputs.iter().filter(|o| o.emergency_toggle) {
        set_output(hw, o, !any_was_on);
        toggled += 1;
    }

    let mut zeroed = 0;
    for o in outputs.iter().filter(|o| o.emergency_zero) {
        set_output(hw, o, false);
        zeroed += 1;
    }

    warn!(
        "INTERLOCK: lighting zeroed, {} toggled {}, {} forced off",
        toggled,
        if any_was_on { "off" } else { "on" },
        zeroed
    );

    InterlockTrip {
        any_was_on,
        toggled,
        zeroed,
    }
}
