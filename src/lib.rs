//! Stereo balance monitor for the default output device.
//!
//! Polls the per-channel volume levels of the default render device and
//! re-balances them when the movement since the last poll looks like a
//! single-channel adjustment rather than a master volume change.
//!
//! ## Behavior
//!
//! - Polls slowly while idle, quickly for a short window after a resync
//! - Syncs the untouched channel to the adjusted one when one channel moved
//! - Sets both channels to their midpoint when both moved comparably
//! - Recovers from device errors by skipping the cycle, never by exiting

pub mod audio;
pub mod config;
pub mod monitor;

pub use audio::{AudioError, ChannelReading, StereoEndpoint};
pub use config::MonitorConfig;
pub use monitor::{BalanceAction, CycleOutcome, PollMode, PollerState};
