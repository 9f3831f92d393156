//! Output drive, blink scheduling and status indicator logic.

pub mod blink;
pub mod outputs;
pub mod status;

pub use status::Rgb;
