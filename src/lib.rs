//! Automation node firmware library.
//!
//! Exposes the control core for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod inputs;
pub mod pins;
pub mod safety;
pub mod scheduler;

mod esp_link_shims;
