//! Per-channel volume control using IAudioEndpointVolume.

use super::device::AudioError;
use super::endpoint::StereoEndpoint;
use windows::Win32::Media::Audio::{Endpoints::IAudioEndpointVolume, IMMDevice};
use windows::Win32::System::Com::CLSCTX_ALL;

/// Volume controller for a specific render device.
pub struct VolumeController {
    endpoint_volume: IAudioEndpointVolume,
}

impl VolumeController {
    /// Create a new VolumeController for the given device.
    pub fn new(device: &IMMDevice) -> Result<Self, AudioError> {
        unsafe {
            let endpoint_volume: IAudioEndpointVolume = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|_| AudioError::VolumeNotAvailable)?;

            Ok(Self { endpoint_volume })
        }
    }
}

impl StereoEndpoint for VolumeController {
    fn channel_count(&self) -> Result<u32, AudioError> {
        unsafe {
            self.endpoint_volume
                .GetChannelCount()
                .map_err(AudioError::WindowsError)
        }
    }

    fn channel_level_db(&self, channel: u32) -> Result<f32, AudioError> {
        unsafe {
            self.endpoint_volume
                .GetChannelVolumeLevel(channel)
                .map_err(AudioError::WindowsError)
        }
    }

    fn set_channel_level_db(&self, channel: u32, level_db: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint_volume
                .SetChannelVolumeLevel(channel, level_db, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }
}
