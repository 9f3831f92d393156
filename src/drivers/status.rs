//! Status indicator state machine with priority-based colour selection.
//!
//! Runs at the slow rate and derives one colour for every indicator unit.
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **Offline**: transport disconnected: red
//! 2. **SupervisorLost**: connected, no supervisor heartbeat: yellow (red + green)
//! 3. **Healthy**: connected and supervised: green
//!
//! Lock mode is overlaid on top of any of these as the blue channel, at
//! the same brightness as the red/green part.

use log::info;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// Link health as shown on the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    /// No broker session.
    Offline,
    /// Broker reachable, supervisor not reporting alive.
    SupervisorLost,
    /// Broker reachable and supervisor alive.
    Healthy,
}

impl LinkHealth {
    pub fn derive(connected: bool, heartbeat_alive: bool) -> Self {
        if !connected {
            Self::Offline
        } else if !heartbeat_alive {
            Self::SupervisorLost
        } else {
            Self::Healthy
        }
    }
}

/// Indicator colour for a health state, lock overlay and brightness.
pub fn indicator_colour(health: LinkHealth, locked: bool, brightness: u8) -> Rgb {
    let blue = if locked { brightness } else { 0 };
    match health {
        LinkHealth::Offline => (brightness, 0, blue),
        LinkHealth::SupervisorLost => (brightness, brightness, blue),
        LinkHealth::Healthy => (0, brightness, blue),
    }
}

/// Tracks the displayed health so transitions can be reported once.
#[derive(Debug, Clone)]
pub struct StatusStateMachine {
    health: Option<LinkHealth>,
}

impl Default for StatusStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStateMachine {
    pub fn new() -> Self {
        Self { health: None }
    }

    /// Re-derive the indicator output.  Returns the colour to show and,
    /// if the health changed since the last refresh, the new health.
    pub fn tick(
        &mut self,
        connected: bool,
        heartbeat_alive: bool,
        locked: bool,
        brightness: u8,
    ) -> (Rgb, Option<LinkHealth>) {
        let health = LinkHealth::derive(connected, heartbeat_alive);
        let changed = (self.health != Some(health)).then_some(health);
        if changed.is_some() {
            info!("status: {:?} -> {:?}", self.health, health);
        }
        self.health = Some(health);
        (indicator_colour(health, locked, brightness), changed)
    }
}
