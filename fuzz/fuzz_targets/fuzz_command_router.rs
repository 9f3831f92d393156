//! Fuzz target: `route`
//!
//! Splits the input into a topic and a payload and routes it against a
//! small config, locked and unlocked.  Routing must never panic and a
//! lighting write must never reach past the channel store.
//!
//! cargo fuzz run fuzz_command_router

#![no_main]

use autonode::app::commands::{Command, route};
use autonode::config::{LightingDeviceConfig, NodeConfig, topic};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (t, payload) = rest.split_at(usize::from(split).min(rest.len()));
    let Ok(t) = core::str::from_utf8(t) else {
        return;
    };

    let mut config = NodeConfig::default();
    let _ = config.lighting_devices.push(LightingDeviceConfig {
        topic: topic("dmx/par"),
        start_channel: 500,
        channel_count: 13,
    });

    for locked in [false, true] {
        if let Ok(Command::WriteLighting { start, data }) = route(&config, locked, t, payload) {
            if start != 0 {
                assert!(start + data.len() <= usize::from(config.lighting_channels));
            }
        }
    }
});
