//! Node configuration.
//!
//! Everything the controller needs to know about its board and its place
//! in the messaging topology: which lines are inputs and outputs, which
//! topics drive what, and the timing base.  Loaded once at startup and
//! never mutated afterwards.
//!
//! All collections are fixed-capacity (`heapless`), so an over-sized
//! configuration fails at deserialization instead of at allocation time.

use heapless::{String, Vec};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of configured digital inputs.
pub const MAX_INPUTS: usize = 32;
/// Maximum number of configured digital outputs.
pub const MAX_OUTPUTS: usize = 32;
/// Maximum number of addressable lighting devices.
pub const MAX_LIGHTING_DEVICES: usize = 16;
/// Maximum topic length in bytes (without the override prefix).
pub const MAX_TOPIC_LEN: usize = 64;
/// Maximum override prefix length in bytes.
pub const MAX_PREFIX_LEN: usize = 16;
/// Longest accepted base tick.
pub const MAX_BASE_TICK_MS: u32 = 1000;

/// A configured topic string.
pub type Topic = String<MAX_TOPIC_LEN>;

// ---------------------------------------------------------------------------
// Pin reference
// ---------------------------------------------------------------------------

/// A digital line, addressed as (port, pin-within-port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub port: u8,
    pub pin: u8,
}

impl PinRef {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

// ---------------------------------------------------------------------------
// Per-line configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub pin: PinRef,
    /// Enable the internal pull-up at startup.
    #[serde(default)]
    pub pull_up: bool,
    /// Publish the inverted level.
    #[serde(default)]
    pub inverted: bool,
    /// An edge on this input trips the emergency interlock while the
    /// supervisor is unreachable.
    #[serde(default)]
    pub emergency_switch: bool,
    /// Retained state topic.
    pub topic: Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub pin: PinRef,
    /// On = released to high impedance, off = driven low.
    #[serde(default)]
    pub open_drain: bool,
    /// Run the blink scheduler for this output.
    #[serde(default)]
    pub blink: bool,
    /// Member of the interlock's unified toggle group.
    #[serde(default)]
    pub emergency_toggle: bool,
    /// Forced off by the interlock.
    #[serde(default)]
    pub emergency_zero: bool,
    /// Command topic.
    pub topic: Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightingDeviceConfig {
    pub topic: Topic,
    /// First channel of the device, 1-based as on the fixture's DIP switches.
    pub start_channel: u16,
    /// Number of channels the device occupies.
    pub channel_count: u16,
}

impl LightingDeviceConfig {
    /// First channel as a 0-based index into the channel store.
    pub fn first_channel(&self) -> usize {
        usize::from(self.start_channel.saturating_sub(1))
    }
}

// ---------------------------------------------------------------------------
// Control plane
// ---------------------------------------------------------------------------

/// Fixed control topics plus the lock-bypass prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTopics {
    /// Supervisor liveness reports (payload byte non-zero = alive).
    pub heartbeat_report: Topic,
    /// Lock mode (payload byte non-zero = locked).
    pub lock_mode: Topic,
    /// Status indicator brightness.
    pub indicator_brightness: Topic,
    /// Fan PWM duty.
    pub fan_speed: Topic,
    /// This node's own retained liveness announcement.
    pub liveness: Topic,
    /// Topics starting with this prefix bypass lock mode.
    pub override_prefix: String<MAX_PREFIX_LEN>,
}

impl Default for ControlTopics {
    fn default() -> Self {
        Self {
            heartbeat_report: topic("heartbeat/supervisor"),
            lock_mode: topic("node/locked"),
            indicator_brightness: topic("node/status-light"),
            fan_speed: topic("node/fan"),
            liveness: topic("heartbeat/node"),
            override_prefix: String::try_from("sudo/").unwrap_or_default(),
        }
    }
}

/// Broker connection parameters, handed to the transport untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_url: String<128>,
    pub client_id: String<32>,
    #[serde(default)]
    pub username: Option<String<32>>,
    #[serde(default)]
    pub password: Option<String<64>>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: String::try_from("mqtt://broker.local:1883").unwrap_or_default(),
            client_id: String::try_from("autonode").unwrap_or_default(),
            username: None,
            password: None,
        }
    }
}

/// Station-mode WiFi credentials.  An empty password means an open network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String<32>,
    #[serde(default)]
    pub password: String<64>,
}

// ---------------------------------------------------------------------------
// Node configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub inputs: Vec<InputConfig, MAX_INPUTS>,
    #[serde(default)]
    pub outputs: Vec<OutputConfig, MAX_OUTPUTS>,
    #[serde(default)]
    pub lighting_devices: Vec<LightingDeviceConfig, MAX_LIGHTING_DEVICES>,
    /// Raw channel writes starting at channel 0.
    pub bulk_lighting_topic: Topic,
    #[serde(default)]
    pub topics: ControlTopics,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub wifi: WifiConfig,

    // --- Timing ---
    /// Base tick period in milliseconds.  Blink runs every 10th tick,
    /// the status indicator every 100th.
    #[serde(default = "default_base_tick_ms")]
    pub base_tick_ms: u32,

    // --- Hardware ---
    /// Size of the lighting channel store.
    #[serde(default = "default_lighting_channels")]
    pub lighting_channels: u16,
    /// Number of chained status indicator units.
    #[serde(default = "default_indicator_units")]
    pub indicator_units: u8,
    /// Indicator brightness until the supervisor sets one.
    #[serde(default = "default_indicator_brightness")]
    pub default_indicator_brightness: u8,
    /// Fan duty at power-up.
    #[serde(default = "default_fan_duty")]
    pub default_fan_duty: u8,
}

fn default_base_tick_ms() -> u32 {
    10
}
fn default_lighting_channels() -> u16 {
    512
}
fn default_indicator_units() -> u8 {
    4
}
fn default_indicator_brightness() -> u8 {
    0x10
}
fn default_fan_duty() -> u8 {
    0xFF
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            lighting_devices: Vec::new(),
            bulk_lighting_topic: topic("dmx/node"),
            topics: ControlTopics::default(),
            mqtt: MqttConfig::default(),
            wifi: WifiConfig::default(),
            base_tick_ms: default_base_tick_ms(),
            lighting_channels: default_lighting_channels(),
            indicator_units: default_indicator_units(),
            default_indicator_brightness: default_indicator_brightness(),
            default_fan_duty: default_fan_duty(),
        }
    }
}

impl NodeConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            warn!("config: JSON rejected: {}", e);
            Error::Config("malformed or over-capacity JSON")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the controller cannot run safely.
    pub fn validate(&self) -> Result<()> {
        if self.base_tick_ms == 0 {
            return Err(Error::Config("base_tick_ms must be non-zero"));
        }
        if self.base_tick_ms > MAX_BASE_TICK_MS {
            return Err(Error::Config("base_tick_ms exceeds one second"));
        }
        if self.indicator_units == 0 {
            return Err(Error::Config("indicator_units must be non-zero"));
        }
        if self.topics.override_prefix.is_empty() {
            return Err(Error::Config("override prefix must not be empty"));
        }

        let t = &self.topics;
        let fixed = [
            &self.bulk_lighting_topic,
            &t.heartbeat_report,
            &t.lock_mode,
            &t.indicator_brightness,
            &t.fan_speed,
            &t.liveness,
        ];
        let lines = self
            .inputs
            .iter()
            .map(|i| &i.topic)
            .chain(self.outputs.iter().map(|o| &o.topic))
            .chain(self.lighting_devices.iter().map(|d| &d.topic));
        if fixed.into_iter().chain(lines).any(|t| t.is_empty()) {
            return Err(Error::Config("topics must not be empty"));
        }

        if self
            .outputs
            .iter()
            .any(|o| o.emergency_toggle && o.emergency_zero)
        {
            return Err(Error::Config(
                "an output may be in only one emergency group",
            ));
        }

        for dev in &self.lighting_devices {
            if dev.start_channel == 0 {
                return Err(Error::Config("lighting start_channel is 1-based"));
            }
            if dev.channel_count == 0 {
                return Err(Error::Config("lighting channel_count must be non-zero"));
            }
            let end = dev.first_channel() + usize::from(dev.channel_count);
            if end > usize::from(self.lighting_channels) {
                return Err(Error::Config("lighting device exceeds channel store"));
            }
        }

        Ok(())
    }

    /// Period of the blink scheduler in milliseconds.
    pub fn blink_period_ms(&self) -> u32 {
        self.base_tick_ms
            .saturating_mul(u32::from(crate::scheduler::BLINK_DIVIDER))
    }

    /// Period of the status indicator refresh in milliseconds.
    pub fn status_period_ms(&self) -> u32 {
        self.base_tick_ms
            .saturating_mul(u32::from(crate::scheduler::STATUS_DIVIDER))
    }
}

/// Build a [`Topic`] from a literal, truncating at capacity.
pub fn topic(s: &str) -> Topic {
    let mut t = Topic::new();
    for c in s.chars() {
        if t.push(c).is_err() {
            break;
        }
    }
    t
}
