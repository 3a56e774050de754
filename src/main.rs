//! Entry point: wires logging, shutdown, and the platform endpoint together.

use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(windows)]
fn run() -> anyhow::Result<()> {
    use balance_monitor_rs::audio::{default_render_device, ComGuard, VolumeController};
    use balance_monitor_rs::{monitor, MonitorConfig};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tracing::info;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::Relaxed);
    })?;

    let config = MonitorConfig::default();
    info!(
        slow_s = config.slow_interval.as_secs_f32(),
        fast_s = config.fast_interval.as_secs_f32(),
        fast_for_s = config.fast_duration.as_secs_f32(),
        "starting adaptive balance monitor, Ctrl+C to stop"
    );

    let _com = ComGuard::new()?;
    let device = default_render_device()?;
    let endpoint = VolumeController::new(&device)?;

    monitor::run(&endpoint, &config, &stop)?;
    Ok(())
}

#[cfg(not(windows))]
fn run() -> anyhow::Result<()> {
    anyhow::bail!("only the Windows default render device is supported on this build")
}
