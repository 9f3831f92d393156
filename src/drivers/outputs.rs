//! Digital output drive.
//!
//! Maps the logical on/off state of a configured output onto the line's
//! direction and latch:
//!
//! | Mode       | On                        | Off               |
//! |------------|---------------------------|-------------------|
//! | Push-pull  | driven, latch high        | driven, latch low |
//! | Open-drain | released (high-Z, pulled up) | driven, latch low |
//!
//! Reading back follows the same table, so an output reads "on" if it is
//! driven high, or if it is open-drain and currently released.

use crate::app::ports::{Direction, GpioPort};
use crate::config::OutputConfig;

/// Configure an output line at startup: driven, off.
pub fn init_output(gpio: &mut impl GpioPort, cfg: &OutputConfig) {
    gpio.set_drive_level(cfg.pin, false);
    gpio.set_direction(cfg.pin, Direction::Output);
}

/// Drive an output to a logical state.
pub fn set_output(gpio: &mut impl GpioPort, cfg: &OutputConfig, on: bool) {
    if cfg.open_drain {
        if on {
            gpio.set_direction(cfg.pin, Direction::Input);
        } else {
            gpio.set_drive_level(cfg.pin, false);
            gpio.set_direction(cfg.pin, Direction::Output);
        }
    } else {
        gpio.set_drive_level(cfg.pin, on);
    }
}

/// Logical state of an output as the control logic sees it.
pub fn output_is_on(gpio: &impl GpioPort, cfg: &OutputConfig) -> bool {
    match gpio.direction(cfg.pin) {
        Direction::Output => gpio.drive_level(cfg.pin),
        Direction::Input => cfg.open_drain,
    }
}
