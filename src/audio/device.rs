//! Audio data models and errors.

use std::time::Instant;
use thiserror::Error;

/// One poll of both channel levels.
///
/// Immutable once captured; each cycle's reading supersedes the last.
#[derive(Debug, Clone, Copy)]
pub struct ChannelReading {
    /// Left channel level in dB (endpoint channel 0).
    pub left_db: f32,

    /// Right channel level in dB (endpoint channel 1).
    pub right_db: f32,

    /// When the levels were read; drives fast-mode expiry.
    pub taken_at: Instant,
}

impl ChannelReading {
    /// Create a reading taken at the given instant.
    pub fn new(left_db: f32, right_db: f32, taken_at: Instant) -> Self {
        Self {
            left_db,
            right_db,
            taken_at,
        }
    }

    /// Absolute difference between the two channels, in dB.
    pub fn spread_db(&self) -> f32 {
        (self.left_db - self.right_db).abs()
    }

    /// Midpoint of the two channels, in dB.
    pub fn mean_db(&self) -> f32 {
        (self.left_db + self.right_db) / 2.0
    }
}

/// Audio service error types.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No default render device available")]
    NoDefaultDevice,

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[error("Device exposes {count} channel(s); need stereo to balance")]
    NotStereo { count: u32 },

    #[error("Device disconnected or inaccessible")]
    DeviceLost,

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),
}
