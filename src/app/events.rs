//! Outbound application events.
//!
//! The [`NodeController`](super::service::NodeController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, count them,
//! record them in a test.

use crate::drivers::status::LinkHealth;
use crate::safety::InterlockTrip;

use super::commands::Dropped;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup sequence finished; carries the number of inputs and outputs.
    Started { inputs: usize, outputs: usize },

    /// Transport (re)connected; every input was queued for republishing.
    Resynced { queued: usize },

    /// An input edge was queued for publishing.
    InputQueued { input: usize },

    /// An emergency switch tripped the interlock.
    InterlockTripped { input: usize, trip: InterlockTrip },

    /// The supervisor heartbeat flag changed.
    HeartbeatChanged(bool),

    /// Lock mode changed.
    LockChanged(bool),

    /// The status indicator entered a new link-health state.
    IndicatorChanged(LinkHealth),

    /// An inbound message was not applied.
    CommandDropped(Dropped),
}
