//! The seam between the polling loop and the platform volume API.

use super::device::AudioError;

/// Left channel index on the endpoint.
pub const LEFT: u32 = 0;

/// Right channel index on the endpoint.
pub const RIGHT: u32 = 1;

/// Per-channel volume access on a render endpoint.
///
/// Implemented by `VolumeController` over `IAudioEndpointVolume` on Windows,
/// and by scripted endpoints in tests.
pub trait StereoEndpoint {
    /// Number of channels the endpoint exposes.
    fn channel_count(&self) -> Result<u32, AudioError>;

    /// Current level of one channel, in dB.
    fn channel_level_db(&self, channel: u32) -> Result<f32, AudioError>;

    /// Set the absolute level of one channel, in dB.
    fn set_channel_level_db(&self, channel: u32, level_db: f32) -> Result<(), AudioError>;
}
