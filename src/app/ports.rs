//! Port traits: the hexagonal boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeController (domain)
//! ```
//!
//! Driven adapters (GPIO, messaging, lighting store, indicator, fan, event
//! sinks) implement these traits.  The
//! [`NodeController`](super::service::NodeController) consumes them via
//! generics, so the control core never touches registers or sockets.
//!
//! Every port call is non-blocking: the controller runs to completion on
//! a single context and a port that cannot make progress must say so
//! immediately rather than wait.

use core::fmt;

use crate::config::PinRef;
use crate::drivers::Rgb;

// ───────────────────────────────────────────────────────────────
// GPIO port (digital lines, both directions)
// ───────────────────────────────────────────────────────────────

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Line is released (high impedance) and can be sampled.
    Input,
    /// Line is driven to its latch level.
    Output,
}

/// Per-line access to the digital I/O block.
pub trait GpioPort {
    /// Sample the physical level present on the line.
    fn input_level(&self, pin: PinRef) -> bool;

    /// Current output latch level (what the line drives when it is an output).
    fn drive_level(&self, pin: PinRef) -> bool;

    /// Set the output latch level.
    fn set_drive_level(&mut self, pin: PinRef, high: bool);

    /// Current line direction.
    fn direction(&self, pin: PinRef) -> Direction;

    /// Switch the line direction.
    fn set_direction(&mut self, pin: PinRef, direction: Direction);

    /// Enable or disable the internal pull-up on an input line.
    fn set_pull_up(&mut self, pin: PinRef, enabled: bool);
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the publish/subscribe link.
///
/// Connection management, subscriptions and inbound delivery belong to
/// the adapter; inbound traffic reaches the controller through the
/// [`LINK_EVENTS`](crate::events::LINK_EVENTS) mailbox.
pub trait MessagingPort {
    /// Whether the transport session to the broker is established.
    fn is_connected(&self) -> bool;

    /// Queue a publish.  Must return immediately; `Err` leaves the caller
    /// to retry on a later tick.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Lighting port (channel store)
// ───────────────────────────────────────────────────────────────

/// Contiguous lighting channel storage (a DMX-style universe).
pub trait LightingPort {
    /// Write `data` starting at 0-based channel `start`.
    fn write_channels(&mut self, start: usize, data: &[u8]);

    /// Set every channel to zero.
    fn clear_channels(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (status LEDs)
// ───────────────────────────────────────────────────────────────

/// The chain of status indicator units.  Every unit shows the same colour.
pub trait IndicatorPort {
    fn set_all(&mut self, colour: Rgb);
}

// ───────────────────────────────────────────────────────────────
// Fan port (PWM duty register)
// ───────────────────────────────────────────────────────────────

/// Single-byte fan PWM duty, 0 (stopped) to 255 (full).
pub trait FanPort {
    fn set_duty(&mut self, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`MessagingPort::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// Outbound buffer is momentarily saturated.
    BufferFull,
    /// No broker session.
    NotConnected,
    /// Topic does not fit the transport's topic buffer.
    TopicTooLong,
    /// Payload does not fit the transport's payload buffer.
    PayloadTooLong,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferFull => write!(f, "outbound buffer full"),
            Self::NotConnected => write!(f, "not connected"),
            Self::TopicTooLong => write!(f, "topic too long"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}
