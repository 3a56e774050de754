//! Tuning constants for the polling loop and resync heuristic.

use std::time::Duration;

/// Tuning parameters shared by the poll loop and the decision logic.
///
/// There are no CLI flags; behavior is fixed by these compile-time defaults.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Polling interval while nothing is happening.
    pub slow_interval: Duration,
    /// Polling interval while the user appears to be adjusting volume.
    pub fast_interval: Duration,
    /// How long to keep polling fast after a resync.
    pub fast_duration: Duration,
    /// Channel spread at or below this counts as balanced (dB).
    pub tolerance_db: f32,
    /// How much larger one channel's delta must be to call it the adjusted
    /// channel rather than part of a bulk change (dB).
    pub delta_threshold_db: f32,
    /// Per-channel movement at or below this is treated as readout noise (dB).
    pub noise_floor_db: f32,
    /// Pause after a device error before the next cycle.
    pub recovery_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slow_interval: Duration::from_secs(4),
            fast_interval: Duration::from_millis(500),
            fast_duration: Duration::from_secs(10),
            tolerance_db: 0.4,
            delta_threshold_db: 1.2,
            noise_floor_db: 0.15,
            recovery_delay: Duration::from_secs(2),
        }
    }
}
