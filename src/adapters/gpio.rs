//! ESP-IDF GPIO adapter.
//!
//! Drives lines through the IDF GPIO driver.  Output latch and direction
//! are shadowed here so reads reflect what was last written, independent
//! of the pad's input path.  A [`PinRef`] maps to `port * 32 + pin`.

use esp_idf_svc::sys::{
    gpio_get_level, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
    gpio_pull_mode_t_GPIO_FLOATING, gpio_pull_mode_t_GPIO_PULLUP_ONLY, gpio_set_direction,
    gpio_set_level, gpio_set_pull_mode,
};
use log::warn;

use crate::app::ports::{Direction, GpioPort};
use crate::config::PinRef;

const MAX_LINES: usize = 64;

pub struct EspGpio {
    latch: u64,
    output: u64,
}

impl EspGpio {
    pub fn new() -> Self {
        Self {
            latch: 0,
            output: 0,
        }
    }

    fn line(pin: PinRef) -> Option<i32> {
        let n = usize::from(pin.port) * 32 + usize::from(pin.pin);
        if n >= MAX_LINES {
            warn!("gpio: {:?} out of range", pin);
            return None;
        }
        Some(n as i32)
    }

    fn bit(n: i32) -> u64 {
        1u64 << n
    }
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpio {
    fn input_level(&self, pin: PinRef) -> bool {
        let Some(n) = Self::line(pin) else {
            return false;
        };
        // SAFETY: read-only pad register access on a valid line number.
        (unsafe { gpio_get_level(n) }) != 0
    }

    fn drive_level(&self, pin: PinRef) -> bool {
        Self::line(pin).is_some_and(|n| self.latch & Self::bit(n) != 0)
    }

    fn set_drive_level(&mut self, pin: PinRef, high: bool) {
        let Some(n) = Self::line(pin) else {
            return;
        };
        // SAFETY: valid line number; main-loop only.
        unsafe { gpio_set_level(n, u32::from(high)) };
        if high {
            self.latch |= Self::bit(n);
        } else {
            self.latch &= !Self::bit(n);
        }
    }

    fn direction(&self, pin: PinRef) -> Direction {
        match Self::line(pin) {
            Some(n) if self.output & Self::bit(n) != 0 => Direction::Output,
            _ => Direction::Input,
        }
    }

    fn set_direction(&mut self, pin: PinRef, direction: Direction) {
        let Some(n) = Self::line(pin) else {
            return;
        };
        // Outputs keep their input path so the pad can still be sampled.
        let mode = match direction {
            Direction::Input => gpio_mode_t_GPIO_MODE_INPUT,
            Direction::Output => gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
        };
        // SAFETY: valid line number; main-loop only.
        let ret = unsafe { gpio_set_direction(n, mode) };
        if ret != 0 {
            warn!("gpio{}: set_direction failed ({})", n, ret);
            return;
        }
        match direction {
            Direction::Input => self.output &= !Self::bit(n),
            Direction::Output => self.output |= Self::bit(n),
        }
    }

    fn set_pull_up(&mut self, pin: PinRef, enabled: bool) {
        let Some(n) = Self::line(pin) else {
            return;
        };
        let mode = if enabled {
            gpio_pull_mode_t_GPIO_PULLUP_ONLY
        } else {
            gpio_pull_mode_t_GPIO_FLOATING
        };
        // SAFETY: valid line number; main-loop only.
        let ret = unsafe { gpio_set_pull_mode(n, mode) };
        if ret != 0 {
            warn!("gpio{}: set_pull_mode failed ({})", n, ret);
        }
    }
}
