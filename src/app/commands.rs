//! Inbound command routing.
//!
//! Every message from the broker is resolved into a [`Command`] (or a
//! [`Dropped`] reason) by [`route`], a pure function of the configuration,
//! the lock flag and the message.  The
//! [`NodeController`](super::service::NodeController) then applies the
//! command to hardware and controller state.
//!
//! ## Resolution order
//!
//! 1. Override prefix present → strip it, skip the lock check.
//!    Otherwise, locked → drop.  No topic is exempt from the lock,
//!    including the lock topic itself.
//! 2. Empty payload → drop.
//! 3. Exact topic match, first hit wins: outputs, bulk lighting, lighting
//!    devices, heartbeat, lock mode, indicator brightness, fan speed.
//! 4. Anything else → drop as unknown.

use heapless::String;

use crate::config::{MAX_PREFIX_LEN, MAX_TOPIC_LEN, NodeConfig};

/// Longest topic the node subscribes to (override prefix included).
pub const MAX_SUBSCRIPTION_LEN: usize = MAX_PREFIX_LEN + MAX_TOPIC_LEN;

/// A resolved inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Store `pattern` for output `index` and drive it to `pattern != 0`.
    SetOutput { index: usize, pattern: u8 },
    /// Write lighting channels starting at 0-based `start`.
    WriteLighting { start: usize, data: &'a [u8] },
    /// Supervisor liveness report.
    SetHeartbeat(bool),
    /// Enter or leave lock mode.
    SetLocked(bool),
    /// Status indicator brightness.
    SetIndicatorBrightness(u8),
    /// Fan PWM duty.
    SetFanSpeed(u8),
}

/// Why a message was not turned into a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dropped {
    /// Lock mode is on and the topic carried no override prefix.
    Locked,
    /// The payload was empty.
    EmptyPayload,
    /// No configured topic matched.
    UnknownTopic,
}

/// Resolve one inbound message.
pub fn route<'a>(
    config: &NodeConfig,
    locked: bool,
    topic: &str,
    payload: &'a [u8],
) -> Result<Command<'a>, Dropped> {
    let topic = match topic.strip_prefix(config.topics.override_prefix.as_str()) {
        Some(stripped) => stripped,
        None if locked => return Err(Dropped::Locked),
        None => topic,
    };

    let Some(&first) = payload.first() else {
        return Err(Dropped::EmptyPayload);
    };

    if let Some(index) = config.outputs.iter().position(|o| o.topic == topic) {
        return Ok(Command::SetOutput {
            index,
            pattern: first,
        });
    }

    if config.bulk_lighting_topic == topic {
        return Ok(Command::WriteLighting {
            start: 0,
            data: payload,
        });
    }

    if let Some(dev) = config.lighting_devices.iter().find(|d| d.topic == topic) {
        let len = payload.len().min(usize::from(dev.channel_count));
        return Ok(Command::WriteLighting {
            start: dev.first_channel(),
            data: &payload[..len],
        });
    }

    let t = &config.topics;
    if t.heartbeat_report == topic {
        Ok(Command::SetHeartbeat(first != 0))
    } else if t.lock_mode == topic {
        Ok(Command::SetLocked(first != 0))
    } else if t.indicator_brightness == topic {
        Ok(Command::SetIndicatorBrightness(first))
    } else if t.fan_speed == topic {
        Ok(Command::SetFanSpeed(first))
    } else {
        Err(Dropped::UnknownTopic)
    }
}

/// Call `f` once for every topic the node must subscribe to: each
/// command topic plain and with the override prefix.
pub fn for_each_subscription(config: &NodeConfig, mut f: impl FnMut(&str)) {
    let t = &config.topics;
    let topics = config
        .outputs
        .iter()
        .map(|o| &o.topic)
        .chain(core::iter::once(&config.bulk_lighting_topic))
        .chain(config.lighting_devices.iter().map(|d| &d.topic))
        .chain([
            &t.heartbeat_report,
            &t.lock_mode,
            &t.indicator_brightness,
            &t.fan_speed,
        ]);

    let mut prefixed: String<MAX_SUBSCRIPTION_LEN> = String::new();
    for topic in topics {
        f(topic);
        prefixed.clear();
        // Capacity covers the longest prefix plus the longest topic.
        if prefixed.push_str(&t.override_prefix).is_ok() && prefixed.push_str(topic).is_ok() {
            f(&prefixed);
        }
    }
}
