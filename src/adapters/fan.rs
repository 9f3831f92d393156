//! Fan PWM adapter over any `embedded-hal` duty-cycle channel.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::FanPort;

/// Maps the 8-bit fan duty onto a PWM channel of any resolution.
pub struct PwmFan<P> {
    pwm: P,
    duty: u8,
}

impl<P: SetDutyCycle> PwmFan<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, duty: 0 }
    }

    /// Last duty written.
    pub fn duty(&self) -> u8 {
        self.duty
    }
}

impl<P: SetDutyCycle> FanPort for PwmFan<P> {
    fn set_duty(&mut self, duty: u8) {
        match self.pwm.set_duty_cycle_fraction(u16::from(duty), 255) {
            Ok(()) => self.duty = duty,
            Err(e) => warn!("fan: duty {} rejected: {:?}", duty, e),
        }
    }
}
