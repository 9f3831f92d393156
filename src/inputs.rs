//! Edge-triggered input monitor with a retry-safe publish queue.
//!
//! Every base tick the monitor samples each configured input and compares
//! it with the previous sample.  What an edge means depends on whether
//! the supervisor can currently be reached:
//!
//! - reachable (transport up, heartbeat alive): the input is marked
//!   *dirty*, i.e. its retained topic holds a stale value;
//! - unreachable: an edge on an emergency switch trips the interlock,
//!   other edges are not queued (a reconnect resyncs every input anyway).
//!
//! The "queue" is one dirty flag per input.  The drain walks inputs in
//! index order and stops at the first failed publish, leaving that flag
//! and every later one set for the next tick.  Ordering across ticks is
//! not guaranteed; only that every flag is eventually cleared.

use heapless::Vec;
use log::{debug, trace};

use crate::app::ports::{GpioPort, MessagingPort};
use crate::config::{InputConfig, MAX_INPUTS};
use crate::error::{Error, Result};

/// What the monitor did with an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Supervisor reachable; the input was marked dirty.
    Queued,
    /// Supervisor unreachable and the input is an emergency switch.
    Emergency,
}

/// Mutable state of one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    /// Level seen by the most recent scan.
    pub prev_level: bool,
    /// The published value is stale relative to `prev_level`.
    pub dirty: bool,
}

/// Outcome of one publish drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Inputs successfully published this pass.
    pub published: usize,
    /// Index of the input whose publish failed, if the pass stopped early.
    pub stalled_at: Option<usize>,
}

/// Input states, indexed like the configured inputs.
#[derive(Debug, Clone)]
pub struct InputMonitor {
    states: Vec<InputState, MAX_INPUTS>,
}

impl InputMonitor {
    /// One cleared state per configured input.
    pub fn new(count: usize) -> Result<Self> {
        let mut states = Vec::new();
        states
            .resize_default(count)
            .map_err(|()| Error::Config("more inputs than the monitor holds"))?;
        Ok(Self { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<InputState> {
        self.states.get(index).copied()
    }

    /// Sample every input as the baseline and queue all of them.
    pub fn prime(&mut self, configs: &[InputConfig], gpio: &impl GpioPort) {
        for (cfg, state) in configs.iter().zip(self.states.iter_mut()) {
            state.prev_level = gpio.input_level(cfg.pin);
            state.dirty = true;
        }
    }

    /// Queue every input for republishing.
    pub fn mark_all_dirty(&mut self) {
        for state in &mut self.states {
            state.dirty = true;
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.states.iter().filter(|s| s.dirty).count()
    }

    /// Sample every input once.
    ///
    /// `on_edge` runs for each queued edge and for each emergency-switch
    /// edge seen while the supervisor is unreachable, in input order, with
    /// the hardware handle so it can drive the interlock.  Returns the
    /// number of edges seen.
    pub fn scan<H: GpioPort>(
        &mut self,
        configs: &[InputConfig],
        hw: &mut H,
        supervisor_reachable: bool,
        mut on_edge: impl FnMut(&mut H, usize, Edge),
    ) -> usize {
        let mut edges = 0;
        for (i, (cfg, state)) in configs.iter().zip(self.states.iter_mut()).enumerate() {
            let level = hw.input_level(cfg.pin);
            if level != state.prev_level {
                edges += 1;
                if supervisor_reachable {
                    debug!("input[{}] '{}' -> {}", i, cfg.topic, level);
                    state.dirty = true;
                    on_edge(hw, i, Edge::Queued);
                } else if cfg.emergency_switch {
                    on_edge(hw, i, Edge::Emergency);
                }
            }
            state.prev_level = level;
        }
        edges
    }

    /// Publish dirty inputs in index order until one publish fails.
    pub fn drain(&mut self, configs: &[InputConfig], link: &mut impl MessagingPort) -> DrainReport {
        let mut report = DrainReport::default();
        for (i, (cfg, state)) in configs.iter().zip(self.states.iter_mut()).enumerate() {
            if !state.dirty {
                continue;
            }
            let value = u8::from(state.prev_level ^ cfg.inverted);
            match link.publish(&cfg.topic, &[value], true) {
                Ok(()) => {
                    state.dirty = false;
                    report.published += 1;
                }
                Err(e) => {
                    trace!("input[{}]: publish deferred ({})", i, e);
                    report.stalled_at = Some(i);
                    break;
                }
            }
        }
        report
    }
}
