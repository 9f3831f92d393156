//! Fixed peripheral pin assignments for the node board.
//!
//! Digital inputs and outputs are assigned per installation in the node
//! configuration; only the on-board peripherals are fixed here.

/// WS2812 status indicator chain data line (RMT channel 0).
pub const INDICATOR_DATA_GPIO: i32 = 48;

/// Fan PWM output (LEDC timer 0, channel 0).
pub const FAN_PWM_GPIO: i32 = 21;

/// Fan PWM carrier frequency; above the audible range.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
