//! Daemon entry point: detach, start logging, then hand over to the scheduler

use super::sync::run_pass;
use crate::logging;
use crate::scheduler::{spawn_signal_listener, wake_channel, Scheduler};
use crate::types::SyncError;
use crate::Config;
use daemonize::Daemonize;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

/// Umask applied after detaching, so new files get 0644 and directories 0755
const DAEMON_UMASK: u32 = 0o022;

/// Run the daemon. Only returns on a setup failure.
///
/// The log file is opened first, while errors can still reach the invoking
/// terminal. Everything that starts threads (the runtime, the log writer)
/// comes after the fork. SIGUSR1 terminates a process by default, so its
/// handler is installed right after the fork, before logging starts.
pub fn run(config: Config) -> Result<(), SyncError> {
    let sink = logging::open_log_sink(&config.log_file)?;

    if !config.foreground {
        detach()?;
    }

    let started = start_runtime();

    let _guard = logging::init(sink, config.verbose, config.foreground)?;
    let (runtime, wake_rx) = match started {
        Ok(started) => started,
        Err(err) => {
            tracing::error!("SyncDaemon stopped: {err}");
            return Err(err);
        }
    };

    log_startup(&config);
    runtime.block_on(serve(config, wake_rx));
    Ok(())
}

/// Current-thread runtime with the SIGUSR1 listener already registered.
///
/// Signals that arrive before the runtime is first driven are kept and
/// delivered once the scheduler starts waiting.
fn start_runtime() -> Result<(Runtime, mpsc::Receiver<()>), SyncError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SyncError::Daemon(format!("failed to build runtime: {e}")))?;

    let (wake_tx, wake_rx) = wake_channel();
    {
        let _enter = runtime.enter();
        spawn_signal_listener(wake_tx)?;
    }
    Ok((runtime, wake_rx))
}

async fn serve(config: Config, wake_rx: mpsc::Receiver<()>) {
    tracing::info!("SyncDaemon running (pid {})", std::process::id());
    Scheduler::new(config.interval, wake_rx)
        .run(|| run_pass(&config))
        .await;
}

/// Fork, start a new session, move to `/` and point stdio at /dev/null.
/// The parent process exits successfully inside this call.
fn detach() -> Result<(), SyncError> {
    Daemonize::new()
        .working_directory("/")
        .umask(DAEMON_UMASK)
        .start()
        .map_err(|e| SyncError::Daemon(e.to_string()))
}

fn log_startup(config: &Config) {
    tracing::info!("--SyncDaemon started--");
    tracing::info!(
        "Source: {}  Destination: {}",
        config.source.display(),
        config.destination.display()
    );
    if config.recursive {
        tracing::info!("Option: recursive");
    }
    tracing::info!(
        "Interval: {}s  mmap threshold: {} bytes",
        config.interval.as_secs(),
        config.mmap_threshold
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;

    #[test]
    #[cfg(unix)]
    fn test_wake_signal_before_scheduler_starts_is_kept() {
        let (runtime, mut wake_rx) = start_runtime().expect("start runtime");

        // Nothing drives the runtime yet; the process must survive the signal.
        let status = Command::new("kill")
            .args(["-USR1", &std::process::id().to_string()])
            .status()
            .expect("run kill");
        assert!(status.success());

        let woke = runtime.block_on(async {
            tokio::time::timeout(Duration::from_secs(10), wake_rx.recv()).await
        });
        assert_eq!(woke.expect("wake delivered before timeout"), Some(()));
    }
}
