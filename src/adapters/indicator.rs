//! WS2812 status indicator chain over the RMT peripheral.
//!
//! Every unit in the chain shows the same colour, so one frame is the
//! same 24-bit GRB word repeated `units` times.

use core::time::Duration;

use esp_idf_svc::hal::gpio::OutputPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::rmt::config::TransmitConfig;
use esp_idf_svc::hal::rmt::{PinState, Pulse, RmtChannel, TxRmtDriver, VariableLengthSignal};
use esp_idf_svc::sys::EspError;
use log::warn;

use crate::app::ports::IndicatorPort;
use crate::drivers::Rgb;

pub struct Ws2812Indicator<'d> {
    tx: TxRmtDriver<'d>,
    units: u8,
    zero: [Pulse; 2],
    one: [Pulse; 2],
}

impl<'d> Ws2812Indicator<'d> {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
        units: u8,
    ) -> Result<Self, EspError> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;
        let hz = tx.counter_clock()?;
        let pulse = |state, ns| Pulse::new_with_duration(hz, state, &Duration::from_nanos(ns));
        Ok(Self {
            zero: [pulse(PinState::High, 350)?, pulse(PinState::Low, 800)?],
            one: [pulse(PinState::High, 700)?, pulse(PinState::Low, 600)?],
            tx,
            units,
        })
    }

    fn frame(&self, (r, g, b): Rgb) -> Result<VariableLengthSignal, EspError> {
        let grb = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);
        let mut signal = VariableLengthSignal::new();
        for _ in 0..self.units {
            for bit in (0..24).rev() {
                let pulses = if grb & (1 << bit) != 0 {
                    &self.one
                } else {
                    &self.zero
                };
                signal.push(pulses)?;
            }
        }
        Ok(signal)
    }
}

impl IndicatorPort for Ws2812Indicator<'_> {
    fn set_all(&mut self, colour: Rgb) {
        let sent = self
            .frame(colour)
            .and_then(|signal| self.tx.start_blocking(&signal));
        if let Err(e) = sent {
            warn!("indicator: frame not sent: {}", e);
        }
    }
}
