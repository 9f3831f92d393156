//! Automation node firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  EspGpio  ChannelBuffer  Ws2812Indicator  PwmFan  MqttLink   │
//! │  (Gpio)   (Lighting)     (Indicator)      (Fan)   (Messaging)│
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │             NodeController (pure logic)                │  │
//! │  │  inputs · blink · interlock · router · status          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Fixed-period loop: up to MAILBOX_DEPTH events, then on_tick │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::time::Duration;
use std::thread;
use std::time::Instant;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::AnyOutputPin;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use autonode::adapters::fan::PwmFan;
use autonode::adapters::gpio::EspGpio;
use autonode::adapters::hardware::NodeHardware;
use autonode::adapters::indicator::Ws2812Indicator;
use autonode::adapters::lighting::ChannelBuffer;
use autonode::adapters::log_sink::LogEventSink;
use autonode::adapters::mqtt::MqttLink;
use autonode::adapters::wifi;
use autonode::app::service::NodeController;
use autonode::config::NodeConfig;
use autonode::events::{LINK_EVENTS, LinkEvent, MAILBOX_DEPTH};
use autonode::pins;

/// Channels held by the lighting store.
const LIGHTING_UNIVERSE: usize = 512;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("autonode v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = NodeConfig::from_json(include_bytes!("../config/node.json"))?;
    if usize::from(config.lighting_channels) > LIGHTING_UNIVERSE {
        warn!(
            "lighting_channels {} exceeds store, writes clip at {}",
            config.lighting_channels, LIGHTING_UNIVERSE
        );
    }

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let _wifi = wifi::connect_station(peripherals.modem, sys_loop, nvs, &config.wifi)?;

    // ── 4. Adapters ───────────────────────────────────────────
    // SAFETY: both lines are reserved for these peripherals on this board
    // and are not handed out anywhere else.
    let (fan_pin, indicator_pin) = unsafe {
        (
            AnyOutputPin::new(pins::FAN_PWM_GPIO),
            AnyOutputPin::new(pins::INDICATOR_DATA_GPIO),
        )
    };
    let fan_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new().frequency(pins::FAN_PWM_FREQ_HZ.Hz()),
    )?;
    let fan = PwmFan::new(LedcDriver::new(peripherals.ledc.channel0, fan_timer, fan_pin)?);
    let indicator =
        Ws2812Indicator::new(peripherals.rmt.channel0, indicator_pin, config.indicator_units)?;

    let mut hw = NodeHardware::new(
        EspGpio::new(),
        ChannelBuffer::<LIGHTING_UNIVERSE>::new(),
        indicator,
        fan,
    );
    let mut sink = LogEventSink::new();
    let mut link = MqttLink::start(&config)?;

    // ── 5. Controller ─────────────────────────────────────────
    let mut node = NodeController::new(config)?;
    node.start(&mut hw, &mut sink);

    // ── 6. Control loop ───────────────────────────────────────
    let period = Duration::from_millis(u64::from(node.config().base_tick_ms));
    let mut deadline = Instant::now();
    loop {
        LINK_EVENTS.drain(MAILBOX_DEPTH, |event| match event {
            LinkEvent::Connected => {
                link.session_started();
                node.on_connect(&mut link, &mut sink);
            }
            LinkEvent::Disconnected => node.on_disconnect(&mut sink),
            LinkEvent::Message(msg) => {
                node.on_message(&msg.topic, &msg.payload, &mut hw, &mut sink);
            }
        });

        node.on_tick(&mut hw, &mut link, &mut sink);

        deadline += period;
        let now = Instant::now();
        match deadline.checked_duration_since(now) {
            Some(wait) => thread::sleep(wait),
            // Overran; restart the cadence instead of bursting to catch up.
            None => deadline = now,
        }
    }
}
