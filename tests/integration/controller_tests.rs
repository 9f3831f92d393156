//! NodeController lifecycle, input publishing, blink timing and status
//! indicator, driven end to end through mock ports.

use autonode::app::events::AppEvent;
use autonode::app::ports::Direction;
use autonode::app::service::NodeController;
use autonode::config::NodeConfig;
use autonode::drivers::status::LinkHealth;

use super::mock_hw::{MockHardware, MockLink, RecordingSink, four_inputs, input, output};

struct Rig {
    node: NodeController,
    hw: MockHardware,
    link: MockLink,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: NodeConfig) -> Self {
        Self::with_hw(config, MockHardware::new())
    }

    fn with_hw(config: NodeConfig, mut hw: MockHardware) -> Self {
        let mut node = NodeController::new(config).unwrap();
        let mut sink = RecordingSink::new();
        node.start(&mut hw, &mut sink);
        Self {
            node,
            hw,
            link: MockLink::connected(),
            sink,
        }
    }

    fn tick(&mut self, n: usize) {
        for _ in 0..n {
            self.node.on_tick(&mut self.hw, &mut self.link, &mut self.sink);
        }
    }

    fn message(&mut self, topic: &str, payload: &[u8]) {
        self.node
            .on_message(topic, payload, &mut self.hw, &mut self.sink);
    }

    fn connect(&mut self) {
        self.link.connected = true;
        self.node.on_connect(&mut self.link, &mut self.sink);
    }

    /// Connected, supervisor alive, startup publishes flushed.
    fn supervised(mut self) -> Self {
        self.connect();
        self.message("heartbeat/supervisor", &[1]);
        self.tick(1);
        self.link.take();
        self
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_brings_hardware_to_power_up_state() {
    let mut config = four_inputs();
    config.inputs[0].pull_up = true;
    let mut od = output(0, "out/od");
    od.open_drain = true;
    config.outputs.push(od).unwrap();
    config.outputs.push(output(1, "out/pp")).unwrap();

    let rig = Rig::new(config.clone());

    assert!(rig.hw.line(config.inputs[0].pin).pull_up);
    assert!(!rig.hw.line(config.inputs[1].pin).pull_up);
    assert_eq!(rig.hw.line(config.inputs[1].pin).direction, Direction::Input);
    for o in &config.outputs {
        let line = rig.hw.line(o.pin);
        assert_eq!(line.direction, Direction::Output);
        assert!(!line.latch);
        assert!(!rig.hw.output_on(o));
    }
    assert_eq!(rig.hw.fan_duty, Some(0xFF));
    assert_eq!(rig.hw.indicator, vec![(0x10, 0, 0)]);
    assert_eq!(rig.node.inputs().dirty_count(), 4);
    assert!(!rig.node.heartbeat_alive());
    assert!(!rig.node.locked());
    assert!(rig.sink.contains(&AppEvent::Started {
        inputs: 4,
        outputs: 2
    }));
    assert!(rig.sink.contains(&AppEvent::IndicatorChanged(LinkHealth::Offline)));
}

#[test]
fn first_tick_publishes_every_input_retained_with_inversion() {
    let mut config = four_inputs();
    config.inputs[1].inverted = true;
    let mut hw = MockHardware::new();
    hw.set_input(config.inputs[0].pin, true);

    let mut rig = Rig::with_hw(config, hw);
    rig.tick(1);

    let published = rig.link.take();
    let got: Vec<(&str, &[u8], bool)> = published
        .iter()
        .map(|p| (p.topic.as_str(), p.payload.as_slice(), p.retain))
        .collect();
    assert_eq!(
        got,
        vec![
            ("in/0", &[1u8][..], true),
            ("in/1", &[1u8][..], true),
            ("in/2", &[0u8][..], true),
            ("in/3", &[0u8][..], true),
        ]
    );
    assert_eq!(rig.node.inputs().dirty_count(), 0);
}

// ── Edges and publishing ──────────────────────────────────────

#[test]
fn supervised_edge_is_published_exactly_once() {
    let config = four_inputs();
    let pin = config.inputs[2].pin;
    let mut rig = Rig::new(config).supervised();

    rig.hw.set_input(pin, true);
    rig.tick(1);
    assert_eq!(rig.link.topics(), vec!["in/2"]);
    assert_eq!(rig.link.published[0].payload, vec![1]);
    assert!(rig.node.inputs().state(2).unwrap().prev_level);
    assert!(rig.sink.contains(&AppEvent::InputQueued { input: 2 }));

    rig.link.take();
    rig.tick(5);
    assert!(rig.link.published.is_empty());
}

#[test]
fn prev_level_tracks_the_pad_after_every_scan() {
    let config = four_inputs();
    let pin = config.inputs[0].pin;
    let mut rig = Rig::new(config).supervised();

    for level in [true, false, false, true, true, false] {
        rig.hw.set_input(pin, level);
        rig.tick(1);
        assert_eq!(rig.node.inputs().state(0).unwrap().prev_level, level);
    }
}

#[test]
fn unsupervised_edge_on_plain_input_is_not_queued() {
    let config = four_inputs();
    let pin = config.inputs[1].pin;
    let mut rig = Rig::new(config);
    rig.tick(1);
    rig.link.take();

    // Connected, but no heartbeat yet.
    rig.hw.set_input(pin, true);
    rig.tick(1);
    assert!(rig.link.published.is_empty());
    assert!(!rig.node.inputs().state(1).unwrap().dirty);
    assert!(rig.node.inputs().state(1).unwrap().prev_level);

    // The next resync carries the level that was missed.
    rig.connect();
    rig.link.take();
    rig.tick(1);
    let p = rig.link.published.iter().find(|p| p.topic == "in/1").unwrap();
    assert_eq!(p.payload, vec![1]);
}

#[test]
fn drain_stops_at_first_failed_publish() {
    let mut rig = Rig::new(four_inputs());
    rig.link.fail("in/2");

    let report = rig.node.on_tick(&mut rig.hw, &mut rig.link, &mut rig.sink);
    assert_eq!(rig.link.topics(), vec!["in/0", "in/1"]);
    assert_eq!(report.published, 2);
    assert_eq!(report.stalled_at, Some(2));
    let dirty: Vec<bool> = (0..4)
        .map(|i| rig.node.inputs().state(i).unwrap().dirty)
        .collect();
    assert_eq!(dirty, vec![false, false, true, true]);

    rig.link.failing.clear();
    rig.link.take();
    rig.tick(1);
    assert_eq!(rig.link.topics(), vec!["in/2", "in/3"]);
    assert_eq!(rig.node.inputs().dirty_count(), 0);
}

#[test]
fn nothing_drains_while_disconnected() {
    let mut rig = Rig::new(four_inputs());
    rig.link.connected = false;
    rig.tick(20);
    assert!(rig.link.published.is_empty());
    assert_eq!(rig.node.inputs().dirty_count(), 4);
}

// ── Reconnect ─────────────────────────────────────────────────

#[test]
fn reconnect_resyncs_and_forgets_supervisor() {
    let mut rig = Rig::new(four_inputs()).supervised();
    assert!(rig.node.heartbeat_alive());
    assert_eq!(rig.node.inputs().dirty_count(), 0);

    rig.connect();

    assert!(!rig.node.heartbeat_alive());
    assert_eq!(rig.node.inputs().dirty_count(), 4);
    let announce = &rig.link.published[0];
    assert_eq!(announce.topic, "heartbeat/node");
    assert_eq!(announce.payload, vec![1]);
    assert!(announce.retain);
    assert!(rig.sink.contains(&AppEvent::HeartbeatChanged(false)));
    assert!(rig.sink.contains(&AppEvent::Resynced { queued: 4 }));
}

#[test]
fn reconnect_is_idempotent() {
    let mut rig = Rig::new(four_inputs());
    rig.connect();
    rig.connect();
    rig.connect();
    assert!(!rig.node.heartbeat_alive());
    assert_eq!(rig.node.inputs().dirty_count(), 4);
    assert_eq!(rig.link.topics(), vec!["heartbeat/node"; 3]);
}

// ── Blink scheduler ───────────────────────────────────────────

fn blinking(name: &str) -> NodeConfig {
    let mut config = NodeConfig::default();
    let mut o = output(0, name);
    o.blink = true;
    config.outputs.push(o).unwrap();
    config
}

/// Output level after each of `passes` blink passes.
fn trace(rig: &mut Rig, passes: usize) -> Vec<bool> {
    let cfg = rig.node.config().outputs[0].clone();
    (0..passes)
        .map(|_| {
            rig.tick(10);
            rig.hw.output_on(&cfg)
        })
        .collect()
}

#[test]
fn symmetric_one_hertz_blink() {
    let mut rig = Rig::new(blinking("out/beacon"));
    rig.message("out/beacon", &[0b01_00_01_00]);
    assert!(rig.hw.output_on(&rig.node.config().outputs[0].clone()));

    let levels = trace(&mut rig, 11);
    assert_eq!(
        levels,
        vec![false, false, false, false, false, true, true, true, true, true, false]
    );
}

#[test]
fn asymmetric_blink() {
    // Leaving high decodes the high pair (25), leaving low the low pair (5).
    let mut rig = Rig::new(blinking("out/beacon"));
    rig.message("out/beacon", &[0b10_00_01_00]);

    let levels = trace(&mut rig, 31);
    assert!(levels[..25].iter().all(|on| !on));
    assert!(levels[25..30].iter().all(|on| *on));
    assert!(!levels[30]);
}

#[test]
fn pattern_zero_forces_output_off_every_pass() {
    let mut rig = Rig::new(blinking("out/beacon"));
    let pin = rig.node.config().outputs[0].pin;
    rig.message("out/beacon", &[0]);

    for _ in 0..3 {
        rig.hw.lines.get_mut(&pin).unwrap().latch = true;
        rig.tick(10);
        assert!(!rig.hw.line(pin).latch);
    }
    assert_eq!(rig.node.blink().state(0).unwrap().pattern, 0);
}

#[test]
fn high_hold_sentinel_never_toggles() {
    let mut rig = Rig::new(blinking("out/beacon"));
    rig.message("out/beacon", &[0b00_00_01_00]);

    assert!(trace(&mut rig, 30).iter().all(|on| *on));
    assert_eq!(rig.node.blink().state(0).unwrap().timer, 0);
}

#[test]
fn low_hold_sentinel_parks_output_low() {
    let mut rig = Rig::new(blinking("out/beacon"));
    rig.message("out/beacon", &[0b01_00_00_00]);

    let levels = trace(&mut rig, 30);
    assert!(levels.iter().all(|on| !on));
}

#[test]
fn new_pattern_restarts_the_phase() {
    let mut rig = Rig::new(blinking("out/beacon"));
    rig.message("out/beacon", &[0b11_11_11_11]);
    rig.tick(30);
    assert!(rig.node.blink().state(0).unwrap().timer > 0);

    rig.message("out/beacon", &[0b01_00_01_00]);
    assert_eq!(rig.node.blink().state(0).unwrap().timer, 0);
}

#[test]
fn non_blinking_output_keeps_commanded_level() {
    let mut config = NodeConfig::default();
    config.outputs.push(output(0, "out/lamp")).unwrap();
    let mut rig = Rig::new(config);

    rig.message("out/lamp", &[0x44]);
    rig.tick(200);
    assert!(rig.hw.output_on(&rig.node.config().outputs[0].clone()));

    rig.message("out/lamp", &[0]);
    assert!(!rig.hw.output_on(&rig.node.config().outputs[0].clone()));
}

// ── Status indicator ──────────────────────────────────────────

#[test]
fn indicator_refreshes_every_hundredth_tick() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.tick(99);
    assert_eq!(rig.hw.indicator.len(), 1);
    rig.tick(1);
    assert_eq!(rig.hw.indicator.len(), 2);
    rig.tick(100);
    assert_eq!(rig.hw.indicator.len(), 3);
}

#[test]
fn indicator_priority_and_lock_overlay() {
    let mut rig = Rig::new(NodeConfig::default());

    rig.link.connected = false;
    rig.tick(100);
    assert_eq!(rig.hw.last_colour(), Some((0x10, 0, 0)));

    rig.link.connected = true;
    rig.tick(100);
    assert_eq!(rig.hw.last_colour(), Some((0x10, 0x10, 0)));

    rig.message("heartbeat/supervisor", &[1]);
    rig.tick(100);
    assert_eq!(rig.hw.last_colour(), Some((0, 0x10, 0)));

    rig.message("node/locked", &[1]);
    rig.tick(100);
    assert_eq!(rig.hw.last_colour(), Some((0, 0x10, 0x10)));

    rig.message("sudo/node/status-light", &[0x80]);
    rig.tick(100);
    assert_eq!(rig.hw.last_colour(), Some((0, 0x80, 0x80)));

    assert!(rig.sink.contains(&AppEvent::IndicatorChanged(LinkHealth::SupervisorLost)));
    assert!(rig.sink.contains(&AppEvent::IndicatorChanged(LinkHealth::Healthy)));
}

#[test]
fn indicator_health_change_is_reported_once() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.tick(500);
    let changes = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::IndicatorChanged(_)))
        .count();
    // Offline at start, SupervisorLost once connected.
    assert_eq!(changes, 2);
}

// ── Misc commands ─────────────────────────────────────────────

#[test]
fn fan_and_brightness_commands() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.message("node/fan", &[42]);
    assert_eq!(rig.hw.fan_duty, Some(42));
    rig.message("node/status-light", &[0x33]);
    assert_eq!(rig.node.indicator_brightness(), 0x33);
}

#[test]
fn inputs_on_separate_ports_are_independent() {
    let mut config = NodeConfig::default();
    let mut a = input(7, "in/a");
    a.pin.port = 0;
    let mut b = input(7, "in/b");
    b.pin.port = 1;
    config.inputs.push(a.clone()).unwrap();
    config.inputs.push(b).unwrap();
    let mut rig = Rig::new(config).supervised();

    rig.hw.set_input(a.pin, true);
    rig.tick(1);
    assert_eq!(rig.link.topics(), vec!["in/a"]);
}

// ── Transport mailbox ─────────────────────────────────────────

#[test]
fn retained_burst_after_subscribe_reaches_every_output() {
    use std::thread;
    use std::time::Duration;

    use autonode::events::{LINK_EVENTS, LinkEvent, MAILBOX_DEPTH};

    let mut config = NodeConfig::default();
    for i in 0..20u8 {
        config.outputs.push(output(i, &format!("out/{i}"))).unwrap();
    }
    let mut rig = Rig::new(config);
    let topics: Vec<String> = (0..20).map(|i| format!("out/{i}")).collect();

    let mut delivered = 0;
    thread::scope(|s| {
        s.spawn(|| {
            for t in &topics {
                assert!(LINK_EVENTS.send_message(t, &[1]));
            }
        });
        while delivered < topics.len() {
            let n = LINK_EVENTS.drain(MAILBOX_DEPTH, |event| {
                if let LinkEvent::Message(msg) = event {
                    rig.message(&msg.topic, &msg.payload);
                }
            });
            assert!(n <= MAILBOX_DEPTH);
            delivered += n;
            rig.tick(1);
            if n == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }
    });

    assert_eq!(delivered, 20);
    let cfg = rig.node.config().clone();
    assert!(cfg.outputs.iter().all(|o| rig.hw.output_on(o)));
}

#[test]
fn disconnect_forgets_the_supervisor() {
    let mut rig = Rig::new(four_inputs()).supervised();
    assert!(rig.node.heartbeat_alive());

    rig.node.on_disconnect(&mut rig.sink);

    assert!(!rig.node.heartbeat_alive());
    assert!(rig.sink.contains(&AppEvent::HeartbeatChanged(false)));
}
