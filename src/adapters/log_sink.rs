//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { inputs, outputs } => {
                info!("START | inputs={} outputs={}", inputs, outputs);
            }
            AppEvent::Resynced { queued } => {
                info!("LINK  | resync, {} inputs queued", queued);
            }
            AppEvent::InputQueued { input } => {
                debug!("INPUT | input={} queued", input);
            }
            AppEvent::InterlockTripped { input, trip } => {
                warn!(
                    "TRIP  | input={} any_was_on={} toggled={} zeroed={}",
                    input, trip.any_was_on, trip.toggled, trip.zeroed
                );
            }
            AppEvent::HeartbeatChanged(alive) => {
                info!("HBEAT | supervisor {}", if *alive { "alive" } else { "lost" });
            }
            AppEvent::LockChanged(locked) => {
                info!("LOCK  | {}", if *locked { "on" } else { "off" });
            }
            AppEvent::IndicatorChanged(health) => {
                info!("LED   | {:?}", health);
            }
            AppEvent::CommandDropped(reason) => {
                debug!("DROP  | {:?}", reason);
            }
        }
    }
}
