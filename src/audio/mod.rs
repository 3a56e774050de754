//! Audio module for Windows Core Audio API interactions.
//!
//! This module provides access to the default render device's per-channel
//! volume levels. The platform-specific pieces are gated to Windows; the
//! [`StereoEndpoint`] trait is what the rest of the crate talks to.

pub mod device;
pub mod endpoint;
#[cfg(windows)]
pub mod enumerator;
#[cfg(windows)]
pub mod volume;

pub use device::{AudioError, ChannelReading};
pub use endpoint::{StereoEndpoint, LEFT, RIGHT};
#[cfg(windows)]
pub use enumerator::{default_render_device, ComGuard};
#[cfg(windows)]
pub use volume::VolumeController;
