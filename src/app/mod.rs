//! Application core: pure control logic, zero I/O.
//!
//! This module contains the rules of the node: command routing, lock
//! gating, liveness tracking and tick orchestration.  All interaction with
//! hardware and the broker happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
