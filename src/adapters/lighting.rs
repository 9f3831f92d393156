//! In-memory lighting channel store.
//!
//! Holds one universe of channel levels for the lighting output driver to
//! stream out.  Writes past the end are clipped.

use log::trace;

use crate::app::ports::LightingPort;

/// Fixed-size channel array.
#[derive(Debug, Clone)]
pub struct ChannelBuffer<const N: usize> {
    channels: [u8; N],
}

impl<const N: usize> ChannelBuffer<N> {
    pub const fn new() -> Self {
        Self { channels: [0; N] }
    }

    pub fn channels(&self) -> &[u8; N] {
        &self.channels
    }
}

impl<const N: usize> Default for ChannelBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LightingPort for ChannelBuffer<N> {
    fn write_channels(&mut self, start: usize, data: &[u8]) {
        let Some(room) = N.checked_sub(start) else {
            trace!("lighting write at {} past end ({})", start, N);
            return;
        };
        let len = data.len().min(room);
        self.channels[start..start + len].copy_from_slice(&data[..len]);
    }

    fn clear_channels(&mut self) {
        self.channels.fill(0);
    }
}
