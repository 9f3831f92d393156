//! Mock adapters for integration tests.
//!
//! Every port is backed by plain in-memory state so tests can set input
//! levels, fail publishes on demand and assert on the full history
//! without touching real GPIO, PWM or sockets.

use std::collections::{HashMap, HashSet};

use autonode::app::events::AppEvent;
use autonode::app::ports::{
    Direction, EventSink, FanPort, GpioPort, IndicatorPort, LightingPort, MessagingPort,
    PublishError,
};
use autonode::config::{
    InputConfig, LightingDeviceConfig, NodeConfig, OutputConfig, PinRef, topic,
};
use autonode::drivers::Rgb;

// ── Digital lines ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Level presented on the pad by the outside world.
    pub input: bool,
    pub latch: bool,
    pub direction: Direction,
    pub pull_up: bool,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            input: false,
            latch: false,
            direction: Direction::Input,
            pull_up: false,
        }
    }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub lines: HashMap<PinRef, Line>,
    pub channels: Vec<u8>,
    pub indicator: Vec<Rgb>,
    pub fan_duty: Option<u8>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            lines: HashMap::new(),
            channels: vec![0; 512],
            indicator: Vec::new(),
            fan_duty: None,
        }
    }

    pub fn line(&self, pin: PinRef) -> Line {
        self.lines.get(&pin).copied().unwrap_or_default()
    }

    pub fn set_input(&mut self, pin: PinRef, level: bool) {
        self.lines.entry(pin).or_default().input = level;
    }

    /// Logical state of an output: driven high, or released if open-drain.
    pub fn output_on(&self, cfg: &OutputConfig) -> bool {
        let l = self.line(cfg.pin);
        match l.direction {
            Direction::Output => l.latch,
            Direction::Input => cfg.open_drain,
        }
    }

    pub fn last_colour(&self) -> Option<Rgb> {
        self.indicator.last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for MockHardware {
    fn input_level(&self, pin: PinRef) -> bool {
        self.line(pin).input
    }

    fn drive_level(&self, pin: PinRef) -> bool {
        self.line(pin).latch
    }

    fn set_drive_level(&mut self, pin: PinRef, high: bool) {
        self.lines.entry(pin).or_default().latch = high;
    }

    fn direction(&self, pin: PinRef) -> Direction {
        self.line(pin).direction
    }

    fn set_direction(&mut self, pin: PinRef, direction: Direction) {
        self.lines.entry(pin).or_default().direction = direction;
    }

    fn set_pull_up(&mut self, pin: PinRef, enabled: bool) {
        self.lines.entry(pin).or_default().pull_up = enabled;
    }
}

impl LightingPort for MockHardware {
    fn write_channels(&mut self, start: usize, data: &[u8]) {
        let end = (start + data.len()).min(self.channels.len());
        if start < end {
            self.channels[start..end].copy_from_slice(&data[..end - start]);
        }
    }

    fn clear_channels(&mut self) {
        self.channels.fill(0);
    }
}

impl IndicatorPort for MockHardware {
    fn set_all(&mut self, colour: Rgb) {
        self.indicator.push(colour);
    }
}

impl FanPort for MockHardware {
    fn set_duty(&mut self, duty: u8) {
        self.fan_duty = Some(duty);
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

pub struct MockLink {
    pub connected: bool,
    /// Publishes to these topics fail with `BufferFull`.
    pub failing: HashSet<String>,
    pub published: Vec<Publish>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn connected() -> Self {
        Self {
            connected: true,
            failing: HashSet::new(),
            published: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    pub fn fail(&mut self, topic: &str) {
        self.failing.insert(topic.to_owned());
    }

    pub fn topics(&self) -> Vec<&str> {
        self.published.iter().map(|p| p.topic.as_str()).collect()
    }

    pub fn take(&mut self) -> Vec<Publish> {
        std::mem::take(&mut self.published)
    }
}

impl MessagingPort for MockLink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PublishError> {
        if !self.connected {
            return Err(PublishError::NotConnected);
        }
        if self.failing.contains(topic) {
            return Err(PublishError::BufferFull);
        }
        self.published.push(Publish {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
            retain,
        });
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config builders ───────────────────────────────────────────

#[allow(dead_code)]
pub fn input(pin: u8, name: &str) -> InputConfig {
    InputConfig {
        pin: PinRef::new(0, pin),
        pull_up: false,
        inverted: false,
        emergency_switch: false,
        topic: topic(name),
    }
}

#[allow(dead_code)]
pub fn output(pin: u8, name: &str) -> OutputConfig {
    OutputConfig {
        pin: PinRef::new(1, pin),
        open_drain: false,
        blink: false,
        emergency_toggle: false,
        emergency_zero: false,
        topic: topic(name),
    }
}

#[allow(dead_code)]
pub fn device(name: &str, start_channel: u16, channel_count: u16) -> LightingDeviceConfig {
    LightingDeviceConfig {
        topic: topic(name),
        start_channel,
        channel_count,
    }
}

/// Four plain inputs `in/0`..`in/3` on port 0, lines 0..3.
#[allow(dead_code)]
pub fn four_inputs() -> NodeConfig {
    let mut c = NodeConfig::default();
    for i in 0..4u8 {
        c.inputs.push(input(i, &format!("in/{i}"))).unwrap();
    }
    c
}
