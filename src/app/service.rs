//! Node controller: the hexagonal core.
//!
//! [`NodeController`] owns every piece of mutable control state: input
//! and output state arrays, the supervisor heartbeat flag, lock mode and
//! indicator brightness.  Its entry points each run to completion before
//! the next may start:
//!
//! - [`on_tick`](NodeController::on_tick) from the base timer,
//! - [`on_connect`](NodeController::on_connect) and
//!   [`on_disconnect`](NodeController::on_disconnect) from the transport,
//! - [`on_message`](NodeController::on_message) for every inbound publish.
//!
//! ```text
//!     GpioPort ◀──▶ ┌────────────────────────────┐ ──▶ EventSink
//!  LightingPort ◀── │       NodeController        │
//! IndicatorPort ◀── │ inputs · blink · interlock  │ ──▶ MessagingPort
//!      FanPort ◀─── │   router · status · sched   │
//!                   └────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::NodeConfig;
use crate::drivers::blink::BlinkScheduler;
use crate::drivers::outputs::{init_output, set_output};
use crate::drivers::status::StatusStateMachine;
use crate::error::Result;
use crate::inputs::{DrainReport, Edge, InputMonitor};
use crate::safety;
use crate::scheduler::PeriodicScheduler;

use super::commands::{self, Command};
use super::events::AppEvent;
use super::ports::{
    Direction, EventSink, FanPort, GpioPort, IndicatorPort, LightingPort, MessagingPort,
};

/// Liveness payload published on every (re)connect.
const ALIVE: [u8; 1] = [1];

// ───────────────────────────────────────────────────────────────
// NodeController
// ───────────────────────────────────────────────────────────────

/// Owns the control state of one automation node.
pub struct NodeController {
    config: NodeConfig,
    inputs: InputMonitor,
    blink: BlinkScheduler,
    status: StatusStateMachine,
    scheduler: PeriodicScheduler,
    heartbeat_alive: bool,
    locked: bool,
    indicator_brightness: u8,
}

impl NodeController {
    /// Validate the configuration and size the state arrays from it.
    ///
    /// Touches no hardware; call [`start`](Self::start) next.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inputs: InputMonitor::new(config.inputs.len())?,
            blink: BlinkScheduler::new(config.outputs.len())?,
            status: StatusStateMachine::new(),
            scheduler: PeriodicScheduler::new(),
            heartbeat_alive: false,
            locked: false,
            indicator_brightness: config.default_indicator_brightness,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the hardware into its power-up state.
    ///
    /// Outputs are driven off, inputs are configured and sampled as the
    /// baseline, every input is queued for its first publish, the fan
    /// gets its default duty and the indicator shows "offline".
    pub fn start(
        &mut self,
        hw: &mut (impl GpioPort + FanPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) {
        for o in &self.config.outputs {
            init_output(hw, o);
        }
        for i in &self.config.inputs {
            hw.set_direction(i.pin, Direction::Input);
            hw.set_pull_up(i.pin, i.pull_up);
        }
        self.inputs.prime(&self.config.inputs, &*hw);

        hw.set_duty(self.config.default_fan_duty);

        self.heartbeat_alive = false;
        self.locked = false;
        self.indicator_brightness = self.config.default_indicator_brightness;
        self.refresh_indicator(false, hw, sink);

        sink.emit(&AppEvent::Started {
            inputs: self.inputs.len(),
            outputs: self.blink.len(),
        });
        info!(
            "NodeController started: {} inputs, {} outputs, tick {} ms, blink {} ms, status {} ms",
            self.inputs.len(),
            self.blink.len(),
            self.config.base_tick_ms,
            self.config.blink_period_ms(),
            self.config.status_period_ms()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one base tick: scan inputs, drain the publish queue, then run
    /// whichever of the blink pass and the indicator refresh are due.
    pub fn on_tick(
        &mut self,
        hw: &mut (impl GpioPort + LightingPort + IndicatorPort),
        link: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) -> DrainReport {
        let connected = link.is_connected();

        // 1. Edge scan.  Emergency edges trip the interlock in place.
        let reachable = connected && self.heartbeat_alive;
        let outputs = &self.config.outputs;
        self.inputs
            .scan(&self.config.inputs, hw, reachable, |hw, input, edge| match edge {
                Edge::Queued => sink.emit(&AppEvent::InputQueued { input }),
                Edge::Emergency => {
                    let trip = safety::trip(outputs, hw);
                    sink.emit(&AppEvent::InterlockTripped { input, trip });
                }
            });

        // 2. Publish drain.
        let report = self.inputs.drain(&self.config.inputs, link);

        // 3. Slower timing domains.
        let fired = self.scheduler.tick();
        if fired.blink {
            self.blink.tick(&self.config.outputs, hw);
        }
        if fired.status {
            self.refresh_indicator(connected, hw, sink);
        }

        report
    }

    /// Transport session established (first connect or reconnect).
    ///
    /// Queues every input for republishing, forgets the supervisor's
    /// liveness until it re-announces itself, and announces our own.
    pub fn on_connect(&mut self, link: &mut impl MessagingPort, sink: &mut impl EventSink) {
        self.inputs.mark_all_dirty();
        if self.heartbeat_alive {
            sink.emit(&AppEvent::HeartbeatChanged(false));
        }
        self.heartbeat_alive = false;

        if let Err(e) = link.publish(&self.config.topics.liveness, &ALIVE, true) {
            warn!("liveness announce failed: {}", e);
        }

        sink.emit(&AppEvent::Resynced {
            queued: self.inputs.dirty_count(),
        });
        info!("link up: {} inputs queued for resync", self.inputs.dirty_count());
    }

    /// Transport session lost.
    ///
    /// The supervisor counts as unreachable until it re-announces itself
    /// on a later session.
    pub fn on_disconnect(&mut self, sink: &mut impl EventSink) {
        if self.heartbeat_alive {
            sink.emit(&AppEvent::HeartbeatChanged(false));
        }
        self.heartbeat_alive = false;
        warn!("link down");
    }

    /// Route and apply one inbound message.
    pub fn on_message(
        &mut self,
        topic: &str,
        payload: &[u8],
        hw: &mut (impl GpioPort + LightingPort + FanPort),
        sink: &mut impl EventSink,
    ) {
        let cmd = match commands::route(&self.config, self.locked, topic, payload) {
            Ok(cmd) => cmd,
            Err(reason) => {
                debug!("dropped '{}': {:?}", topic, reason);
                sink.emit(&AppEvent::CommandDropped(reason));
                return;
            }
        };

        match cmd {
            Command::SetOutput { index, pattern } => {
                self.blink.set_pattern(index, pattern);
                if let Some(cfg) = self.config.outputs.get(index) {
                    set_output(hw, cfg, pattern != 0);
                }
            }
            Command::WriteLighting { start, data } => {
                hw.write_channels(start, data);
            }
            Command::SetHeartbeat(alive) => {
                if alive != self.heartbeat_alive {
                    info!("supervisor heartbeat: {}", if alive { "alive" } else { "lost" });
                    sink.emit(&AppEvent::HeartbeatChanged(alive));
                }
                self.heartbeat_alive = alive;
            }
            Command::SetLocked(locked) => {
                if locked != self.locked {
                    info!("lock mode: {}", if locked { "on" } else { "off" });
                    sink.emit(&AppEvent::LockChanged(locked));
                }
                self.locked = locked;
            }
            Command::SetIndicatorBrightness(b) => {
                self.indicator_brightness = b;
            }
            Command::SetFanSpeed(duty) => {
                hw.set_duty(duty);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn inputs(&self) -> &InputMonitor {
        &self.inputs
    }

    pub fn blink(&self) -> &BlinkScheduler {
        &self.blink
    }

    /// Whether the supervisor has reported alive since the last connect.
    pub fn heartbeat_alive(&self) -> bool {
        self.heartbeat_alive
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn indicator_brightness(&self) -> u8 {
        self.indicator_brightness
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh_indicator(
        &mut self,
        connected: bool,
        hw: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        let (colour, changed) = self.status.tick(
            connected,
            self.heartbeat_alive,
            self.locked,
            self.indicator_brightness,
        );
        hw.set_all(colour);
        if let Some(health) = changed {
            sink.emit(&AppEvent::IndicatorChanged(health));
        }
    }
}
