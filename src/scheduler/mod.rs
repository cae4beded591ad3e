//! Scheduler - sleep, wake on timer or SIGUSR1, run one pass, repeat
//!
//! The wait is a `tokio::select!` between a sleep and a wake channel. The
//! channel holds at most one pending wake, so a burst of signals collapses
//! into a single extra pass.

use crate::executor::ExecutionStats;
use crate::types::SyncError;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Why the scheduler left its wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The sleep interval elapsed
    Timer,
    /// An external wake arrived first
    Signal,
}

/// Create the wake channel. Capacity 1: pending wakes coalesce.
pub fn wake_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(1)
}

/// Queue a wake unless one is already pending.
///
/// Returns `false` only when the scheduler side is gone.
pub fn request_wake(wake_tx: &mpsc::Sender<()>) -> bool {
    match wake_tx.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => true,
        Err(TrySendError::Closed(())) => false,
    }
}

pub struct Scheduler {
    interval: Duration,
    wake_rx: Option<mpsc::Receiver<()>>,
    passes: u64,
}

impl Scheduler {
    pub fn new(interval: Duration, wake_rx: mpsc::Receiver<()>) -> Self {
        Self {
            interval,
            wake_rx: Some(wake_rx),
            passes: 0,
        }
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Sleep for the interval, returning early if a wake is pending or arrives.
    pub async fn wait_for_wake(&mut self) -> WakeReason {
        let Some(wake_rx) = self.wake_rx.as_mut() else {
            tokio::time::sleep(self.interval).await;
            return WakeReason::Timer;
        };

        let woke = tokio::select! {
            _ = tokio::time::sleep(self.interval) => return WakeReason::Timer,
            wake = wake_rx.recv() => wake,
        };

        match woke {
            Some(()) => WakeReason::Signal,
            None => {
                tracing::warn!("wake channel closed, continuing on the timer only");
                self.wake_rx = None;
                tokio::time::sleep(self.interval).await;
                WakeReason::Timer
            }
        }
    }

    /// Wait once, then run `pass` once.
    pub async fn tick<F>(&mut self, pass: &mut F) -> (WakeReason, ExecutionStats)
    where
        F: FnMut() -> ExecutionStats,
    {
        tracing::info!("Going to sleep for {} seconds", self.interval.as_secs());

        let reason = self.wait_for_wake().await;
        match reason {
            WakeReason::Signal => tracing::info!("Received SIGUSR1 signal, waking up daemon"),
            WakeReason::Timer => tracing::info!("Waking up"),
        }

        let stats = pass();
        self.passes += 1;
        (reason, stats)
    }

    /// Run forever. Process termination is the only way out.
    pub async fn run<F>(mut self, mut pass: F)
    where
        F: FnMut() -> ExecutionStats,
    {
        loop {
            let (_, stats) = self.tick(&mut pass).await;
            tracing::debug!(pass = self.passes, errors = stats.errors, "pass finished");
        }
    }
}

/// Forward every SIGUSR1 into the wake channel.
///
/// Must be called from inside a tokio runtime.
#[cfg(unix)]
pub fn spawn_signal_listener(
    wake_tx: mpsc::Sender<()>,
) -> Result<tokio::task::JoinHandle<()>, SyncError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())
        .map_err(|e| SyncError::Daemon(format!("failed to register SIGUSR1 handler: {e}")))?;

    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            if !request_wake(&wake_tx) {
                break;
            }
        }
    }))
}
