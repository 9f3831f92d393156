//! Mailboxes between the MQTT threads and the control loop.
//!
//! The MQTT client delivers connection changes and inbound publishes on
//! its own thread, and its client calls may block while that thread is
//! busy.  The controller must see inbound traffic on the control loop,
//! one event at a time, and must never block on the client.  Two bounded
//! `embassy-sync` channels bridge the threads without heap allocation:
//!
//! ```text
//! ┌──────────────┐  LinkEvent    ┌──────────────┐  LinkRequest  ┌──────────────┐
//! │   mqtt-rx    │──────────────▶│ Control loop │──────────────▶│   mqtt-tx    │
//! │ (waits for   │  LINK_EVENTS  │ (never waits)│ LINK_REQUESTS │ (waits on    │
//! │    space)    │               │              │               │   client)    │
//! └──────────────┘               └──────────────┘               └──────────────┘
//! ```
//!
//! Inbound events are never dropped for lack of space: the receiver
//! thread waits until the control loop has made room.  Only messages too
//! large for the fixed buffers are discarded.  The control loop queues
//! requests with [`Mailbox::try_send`] and treats a full queue as a
//! retryable publish failure.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use futures_lite::future::block_on;
use heapless::{String, Vec};
use log::warn;

use crate::app::commands::MAX_SUBSCRIPTION_LEN;
use crate::app::ports::PublishError;

/// Largest inbound payload: a full lighting universe plus headroom.
pub const MAX_PAYLOAD_LEN: usize = 520;

/// Largest outbound payload.  The node only ever publishes single bytes.
pub const MAX_PUBLISH_LEN: usize = 8;

/// Inbound events held between control loop passes.  Also the most the
/// loop handles per pass.
pub const MAILBOX_DEPTH: usize = 8;

/// Outbound requests held for the sender thread.
pub const REQUEST_DEPTH: usize = 16;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One inbound publish, copied out of the transport's buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String<MAX_SUBSCRIPTION_LEN>,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Copy a message into fixed buffers.  `None` if either part is too long.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        Some(Self {
            topic: String::try_from(topic).ok()?,
            payload: Vec::from_slice(payload).ok()?,
        })
    }
}

/// What the transport reports to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    Message(InboundMessage),
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// One publish, copied for the sender thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String<MAX_SUBSCRIPTION_LEN>,
    pub payload: Vec<u8, MAX_PUBLISH_LEN>,
    pub retain: bool,
}

impl OutboundMessage {
    pub fn new(topic: &str, payload: &[u8], retain: bool) -> Result<Self, PublishError> {
        Ok(Self {
            topic: String::try_from(topic).map_err(|()| PublishError::TopicTooLong)?,
            payload: Vec::from_slice(payload).map_err(|()| PublishError::PayloadTooLong)?,
            retain,
        })
    }
}

/// What the control loop asks of the sender thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRequest {
    Publish(OutboundMessage),
    /// A session started; subscribe to every command topic again.
    Resubscribe,
}

// ---------------------------------------------------------------------------
// Mailbox
// ---------------------------------------------------------------------------

/// Bounded multi-producer queue usable from plain threads.
pub struct Mailbox<T, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> Mailbox<T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue `item`, parking the calling thread until there is room.
    pub fn send(&self, item: T) {
        block_on(self.channel.send(item));
    }

    /// Queue `item` if there is room, otherwise hand it back.
    pub fn try_send(&self, item: T) -> Result<(), T> {
        self.channel
            .try_send(item)
            .map_err(|TrySendError::Full(item)| item)
    }

    /// Park the calling thread until an item arrives.
    pub fn receive(&self) -> T {
        block_on(self.channel.receive())
    }

    /// Take the oldest queued item, if any.
    pub fn pop(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Hand at most `max` queued items to `f`, oldest first.
    pub fn drain(&self, max: usize, mut f: impl FnMut(T)) -> usize {
        let mut n = 0;
        while n < max {
            let Some(item) = self.pop() else {
                break;
            };
            f(item);
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl<const N: usize> Mailbox<LinkEvent, N> {
    /// Copy an inbound publish and queue it, waiting for room.  Returns
    /// `false` if it does not fit the message buffers and was dropped.
    pub fn send_message(&self, topic: &str, payload: &[u8]) -> bool {
        match InboundMessage::new(topic, payload) {
            Some(msg) => {
                self.send(LinkEvent::Message(msg));
                true
            }
            None => {
                warn!(
                    "inbound '{}' ({} bytes) exceeds mailbox buffers, dropped",
                    topic,
                    payload.len()
                );
                false
            }
        }
    }
}

impl<T, const N: usize> Default for Mailbox<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Filled by the MQTT receiver thread, drained by the main loop.
pub static LINK_EVENTS: Mailbox<LinkEvent, MAILBOX_DEPTH> = Mailbox::new();

/// Filled by the main loop, drained by the MQTT sender thread.
pub static LINK_REQUESTS: Mailbox<LinkRequest, REQUEST_DEPTH> = Mailbox::new();
