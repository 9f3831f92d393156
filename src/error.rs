//! Unified error types for the node firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bring-up path's error handling uniform.  All variants are `Copy` so
//! they pass through the controller without allocation.
//!
//! Transient conditions (a saturated publish buffer, an unknown topic,
//! an empty payload) are *not* errors: the controller absorbs them and
//! retries or ignores as appropriate.  Only configuration failures
//! surface here; the binary's bring-up reports through `anyhow`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
