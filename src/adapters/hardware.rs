//! Hardware bundle: one handle that satisfies every hardware port.
//!
//! The controller takes a single `hw` argument bounded by several port
//! traits, which avoids juggling multiple mutable borrows at call sites.
//! [`NodeHardware`] owns one adapter per concern and forwards each trait
//! to the right one.

use crate::app::ports::{Direction, FanPort, GpioPort, IndicatorPort, LightingPort};
use crate::config::PinRef;
use crate::drivers::Rgb;

/// Concrete adapter that combines all hardware behind port traits.
pub struct NodeHardware<G, L, I, F> {
    pub gpio: G,
    pub lighting: L,
    pub indicator: I,
    pub fan: F,
}

impl<G, L, I, F> NodeHardware<G, L, I, F> {
    pub fn new(gpio: G, lighting: L, indicator: I, fan: F) -> Self {
        Self {
            gpio,
            lighting,
            indicator,
            fan,
        }
    }
}

// ── GpioPort ──────────────────────────────────────────────────

impl<G: GpioPort, L, I, F> GpioPort for NodeHardware<G, L, I, F> {
    fn input_level(&self, pin: PinRef) -> bool {
        self.gpio.input_level(pin)
    }

    fn drive_level(&self, pin: PinRef) -> bool {
        self.gpio.drive_level(pin)
    }

    fn set_drive_level(&mut self, pin: PinRef, high: bool) {
        self.gpio.set_drive_level(pin, high);
    }

    fn direction(&self, pin: PinRef) -> Direction {
        self.gpio.direction(pin)
    }

    fn set_direction(&mut self, pin: PinRef, direction: Direction) {
        self.gpio.set_direction(pin, direction);
    }

    fn set_pull_up(&mut self, pin: PinRef, enabled: bool) {
        self.gpio.set_pull_up(pin, enabled);
    }
}

// ── LightingPort ──────────────────────────────────────────────

impl<G, L: LightingPort, I, F> LightingPort for NodeHardware<G, L, I, F> {
    fn write_channels(&mut self, start: usize, data: &[u8]) {
        self.lighting.write_channels(start, data);
    }

    fn clear_channels(&mut self) {
        self.lighting.clear_channels();
    }
}

// ── IndicatorPort / FanPort ───────────────────────────────────

impl<G, L, I: IndicatorPort, F> IndicatorPort for NodeHardware<G, L, I, F> {
    fn set_all(&mut self, colour: Rgb) {
        self.indicator.set_all(colour);
    }
}

impl<G, L, I, F: FanPort> FanPort for NodeHardware<G, L, I, F> {
    fn set_duty(&mut self, duty: u8) {
        self.fan.set_duty(duty);
    }
}
