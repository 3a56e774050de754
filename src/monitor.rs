//! The adaptive polling loop and resync heuristic.
//!
//! Each cycle reads both channel levels, compares them against the previous
//! reading, and decides whether the user adjusted one channel (sync the other
//! to it), moved the master volume (no channel favored, sync both to the
//! midpoint), or did nothing. A resync switches polling to a short fast
//! window so follow-up adjustments are caught quickly.

use crate::audio::{AudioError, ChannelReading, StereoEndpoint, LEFT, RIGHT};
use crate::config::MonitorConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Idle cadence.
    Slow,
    /// Cadence right after a detected adjustment.
    Fast,
}

/// What a resync decided to write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceAction {
    /// Left was adjusted; bring right to the new left level.
    SyncRightToLeft { target_db: f32 },

    /// Right was adjusted; bring left to the new right level.
    SyncLeftToRight { target_db: f32 },

    /// Both moved comparably (master or bulk change); set both to the midpoint.
    SyncBothToMean { target_db: f32 },
}

impl BalanceAction {
    /// The level both channels end up at, in dB.
    pub fn target_db(&self) -> f32 {
        match *self {
            BalanceAction::SyncRightToLeft { target_db }
            | BalanceAction::SyncLeftToRight { target_db }
            | BalanceAction::SyncBothToMean { target_db } => target_db,
        }
    }

    /// Which side the heuristic blamed, for logging.
    pub fn adjusted(&self) -> &'static str {
        match self {
            BalanceAction::SyncRightToLeft { .. } => "left",
            BalanceAction::SyncLeftToRight { .. } => "right",
            BalanceAction::SyncBothToMean { .. } => "both/master",
        }
    }
}

/// Outcome of feeding one reading through the heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// First reading of the run; nothing to compare against.
    Initial,

    /// Neither channel moved beyond the noise floor.
    Idle,

    /// Something moved, but the channels are still within tolerance.
    BalancedChange,

    /// Out of balance after a movement; both channels must be written.
    Resync(BalanceAction),
}

/// Loop-owned state: the previous reading and the fast-mode deadline.
///
/// `previous` is `None` only before the first reading; every decision
/// compares against exactly the immediately prior reading, not an average.
#[derive(Debug, Default)]
pub struct PollerState {
    previous: Option<ChannelReading>,
    fast_until: Option<Instant>,
}

impl PollerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cadence in effect at `now`.
    pub fn mode_at(&self, now: Instant) -> PollMode {
        match self.fast_until {
            Some(deadline) if now < deadline => PollMode::Fast,
            _ => PollMode::Slow,
        }
    }

    /// Sleep length for the cycle that started at `now`.
    pub fn interval_at(&self, now: Instant, config: &MonitorConfig) -> Duration {
        match self.mode_at(now) {
            PollMode::Fast => config.fast_interval,
            PollMode::Slow => config.slow_interval,
        }
    }

    /// Feed one reading through the heuristic.
    ///
    /// Stores the reading as the new baseline and re-arms fast mode when a
    /// resync comes out. No device access and no sleeping happens here, so
    /// the decision logic is testable on its own.
    pub fn observe(&mut self, reading: ChannelReading, config: &MonitorConfig) -> CycleOutcome {
        let outcome = self.decide(&reading, config);
        if let CycleOutcome::Resync(_) = outcome {
            self.fast_until = Some(reading.taken_at + config.fast_duration);
        }
        self.previous = Some(reading);
        outcome
    }

    fn decide(&self, reading: &ChannelReading, config: &MonitorConfig) -> CycleOutcome {
        let Some(prev) = self.previous else {
            return CycleOutcome::Initial;
        };

        let delta_left = reading.left_db - prev.left_db;
        let delta_right = reading.right_db - prev.right_db;
        let changed = delta_left.abs() > config.noise_floor_db
            || delta_right.abs() > config.noise_floor_db;

        if !changed {
            return CycleOutcome::Idle;
        }
        if reading.spread_db() <= config.tolerance_db {
            return CycleOutcome::BalancedChange;
        }

        // Whichever delta clearly dominates names the adjusted channel; a
        // near-tie means the user moved the master volume instead.
        let action = if delta_left.abs() > delta_right.abs() + config.delta_threshold_db {
            BalanceAction::SyncRightToLeft {
                target_db: reading.left_db,
            }
        } else if delta_right.abs() > delta_left.abs() + config.delta_threshold_db {
            BalanceAction::SyncLeftToRight {
                target_db: reading.right_db,
            }
        } else {
            BalanceAction::SyncBothToMean {
                target_db: reading.mean_db(),
            }
        };

        CycleOutcome::Resync(action)
    }
}

/// Run the polling loop until `stop` is set.
///
/// Device errors inside a cycle are logged and followed by the recovery
/// delay; they never end the loop. Errors from the initial channel-count
/// check are fatal.
pub fn run(
    endpoint: &dyn StereoEndpoint,
    config: &MonitorConfig,
    stop: &AtomicBool,
) -> Result<(), AudioError> {
    let channels = endpoint.channel_count()?;
    if channels < 2 {
        return Err(AudioError::NotStereo { count: channels });
    }
    info!(channels, "stereo device detected, monitoring");

    let mut state = PollerState::new();
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        let pause = match run_cycle(&mut state, endpoint, config, now) {
            Ok(()) => state.interval_at(now, config),
            Err(err) => {
                warn!(error = %err, "device error, retrying after recovery delay");
                config.recovery_delay
            }
        };
        sleep_until_stopped(pause, stop);
    }

    info!("stopped");
    Ok(())
}

/// One poll: read both channels, decide, apply any resync.
fn run_cycle(
    state: &mut PollerState,
    endpoint: &dyn StereoEndpoint,
    config: &MonitorConfig,
    now: Instant,
) -> Result<(), AudioError> {
    let mode = state.mode_at(now);
    let left_db = endpoint.channel_level_db(LEFT)?;
    let right_db = endpoint.channel_level_db(RIGHT)?;
    let reading = ChannelReading::new(left_db, right_db, now);

    let (delta_left, delta_right) = match state.previous {
        Some(prev) => (left_db - prev.left_db, right_db - prev.right_db),
        None => (0.0, 0.0),
    };

    match state.observe(reading, config) {
        CycleOutcome::Initial => {
            info!(left_db, right_db, "initial levels");
        }
        CycleOutcome::Idle => {
            debug!(?mode, left_db, right_db, "no movement");
        }
        CycleOutcome::BalancedChange => {
            info!(
                ?mode,
                left_db, right_db, delta_left, delta_right, "small change detected, still balanced"
            );
        }
        CycleOutcome::Resync(action) => {
            let target_db = action.target_db();
            info!(
                ?mode,
                left_db,
                right_db,
                delta_left,
                delta_right,
                target_db,
                adjusted = action.adjusted(),
                "resyncing channels"
            );
            endpoint.set_channel_level_db(LEFT, target_db)?;
            endpoint.set_channel_level_db(RIGHT, target_db)?;
        }
    }

    Ok(())
}

/// Blocking sleep, sliced so a stop request is honored promptly.
fn sleep_until_stopped(total: Duration, stop: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(100);

    let deadline = Instant::now() + total;
    while !stop.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Scripted in-memory endpoint; records every write.
    struct FakeEndpoint {
        channels: u32,
        levels: RefCell<[f32; 2]>,
        writes: RefCell<Vec<(u32, f32)>>,
        fail_reads: Cell<bool>,
    }

    impl FakeEndpoint {
        fn stereo(left_db: f32, right_db: f32) -> Self {
            Self {
                channels: 2,
                levels: RefCell::new([left_db, right_db]),
                writes: RefCell::new(Vec::new()),
                fail_reads: Cell::new(false),
            }
        }

        fn mono() -> Self {
            Self {
                channels: 1,
                levels: RefCell::new([0.0, 0.0]),
                writes: RefCell::new(Vec::new()),
                fail_reads: Cell::new(false),
            }
        }

        fn set_levels(&self, left_db: f32, right_db: f32) {
            *self.levels.borrow_mut() = [left_db, right_db];
        }

        fn writes(&self) -> Vec<(u32, f32)> {
            self.writes.borrow().clone()
        }
    }

    impl StereoEndpoint for FakeEndpoint {
        fn channel_count(&self) -> Result<u32, AudioError> {
            Ok(self.channels)
        }

        fn channel_level_db(&self, channel: u32) -> Result<f32, AudioError> {
            if self.fail_reads.get() {
                return Err(AudioError::DeviceLost);
            }
            Ok(self.levels.borrow()[channel as usize])
        }

        fn set_channel_level_db(&self, channel: u32, level_db: f32) -> Result<(), AudioError> {
            self.levels.borrow_mut()[channel as usize] = level_db;
            self.writes.borrow_mut().push((channel, level_db));
            Ok(())
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// Runs one cycle and returns the writes it produced.
    fn cycle(state: &mut PollerState, endpoint: &FakeEndpoint, now: Instant) -> Vec<(u32, f32)> {
        let before = endpoint.writes().len();
        run_cycle(state, endpoint, &config(), now).unwrap();
        endpoint.writes()[before..].to_vec()
    }

    #[test]
    fn first_reading_never_writes() {
        let endpoint = FakeEndpoint::stereo(-5.0, -25.0);
        let mut state = PollerState::new();

        let writes = cycle(&mut state, &endpoint, Instant::now());
        assert!(writes.is_empty());
    }

    #[test]
    fn within_tolerance_no_write() {
        let endpoint = FakeEndpoint::stereo(-10.0, -10.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        endpoint.set_levels(-9.7, -9.9);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));
        assert!(writes.is_empty());
    }

    #[test]
    fn unchanged_levels_no_write_even_when_unbalanced() {
        let endpoint = FakeEndpoint::stereo(-8.0, -14.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));
        assert!(writes.is_empty());
    }

    #[test]
    fn left_adjustment_syncs_right_to_left() {
        let endpoint = FakeEndpoint::stereo(-12.0, -9.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        // Left moves +2.0, right drifts +0.1.
        endpoint.set_levels(-10.0, -8.9);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));

        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|&(_, db)| approx(db, -10.0)));
        assert_eq!(
            writes.iter().map(|&(ch, _)| ch).collect::<Vec<_>>(),
            vec![LEFT, RIGHT]
        );
    }

    #[test]
    fn right_adjustment_syncs_left_to_right() {
        let endpoint = FakeEndpoint::stereo(-9.0, -12.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        endpoint.set_levels(-8.9, -10.0);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));

        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|&(_, db)| approx(db, -10.0)));
    }

    #[test]
    fn comparable_deltas_sync_to_mean() {
        let endpoint = FakeEndpoint::stereo(-10.0, -12.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        // +1.0 and +0.9: neither dominates by the delta threshold.
        endpoint.set_levels(-9.0, -11.1);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));

        let mean = (-9.0 + -11.1) / 2.0;
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|&(_, db)| approx(db, mean)));
    }

    #[test]
    fn resync_rearms_fast_mode_until_expiry() {
        let cfg = config();
        let mut state = PollerState::new();
        let t0 = Instant::now();

        state.observe(ChannelReading::new(-12.0, -9.0, t0), &cfg);
        let outcome = state.observe(
            ChannelReading::new(-10.0, -8.9, t0 + Duration::from_secs(4)),
            &cfg,
        );
        assert!(matches!(outcome, CycleOutcome::Resync(_)));

        let resync_at = t0 + Duration::from_secs(4);
        assert_eq!(state.mode_at(resync_at + Duration::from_secs(9)), PollMode::Fast);
        assert_eq!(state.mode_at(resync_at + cfg.fast_duration), PollMode::Slow);

        assert_eq!(
            state.interval_at(resync_at + Duration::from_secs(1), &cfg),
            cfg.fast_interval
        );
        assert_eq!(
            state.interval_at(resync_at + Duration::from_secs(11), &cfg),
            cfg.slow_interval
        );
    }

    #[test]
    fn quiet_cycles_keep_slow_mode() {
        let mut state = PollerState::new();
        let t0 = Instant::now();

        state.observe(ChannelReading::new(-10.0, -10.0, t0), &config());
        assert_eq!(state.mode_at(t0 + Duration::from_secs(1)), PollMode::Slow);
    }

    #[test]
    fn resync_settles_on_the_next_cycle() {
        let endpoint = FakeEndpoint::stereo(-12.0, -9.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);
        endpoint.set_levels(-10.0, -8.9);
        cycle(&mut state, &endpoint, t0 + Duration::from_secs(4));

        // Both channels now sit at the resync target; no further writes.
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(5));
        assert!(writes.is_empty());
    }

    #[test]
    fn read_failure_is_recoverable() {
        let endpoint = FakeEndpoint::stereo(-10.0, -10.0);
        let mut state = PollerState::new();
        let t0 = Instant::now();

        cycle(&mut state, &endpoint, t0);

        endpoint.fail_reads.set(true);
        let err = run_cycle(&mut state, &endpoint, &config(), t0 + Duration::from_secs(4));
        assert!(matches!(err, Err(AudioError::DeviceLost)));

        endpoint.fail_reads.set(false);
        let writes = cycle(&mut state, &endpoint, t0 + Duration::from_secs(8));
        assert!(writes.is_empty());
    }

    #[test]
    fn mono_device_rejected() {
        let endpoint = FakeEndpoint::mono();
        let stop = AtomicBool::new(true);

        let err = run(&endpoint, &config(), &stop);
        assert!(matches!(err, Err(AudioError::NotStereo { count: 1 })));
    }
}
