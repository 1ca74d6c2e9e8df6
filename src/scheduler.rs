//! Repeating refresh timer. At most one timer runs at a time.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

pub const DEFAULT_REFRESH_SECS: u64 = 30;
/// One day. Longer periods overflow `Instant` arithmetic on some platforms.
pub const MAX_REFRESH_SECS: u64 = 86_400;

#[derive(Debug, Default)]
pub struct PollScheduler {
    active: Mutex<Option<(Duration, JoinHandle<()>)>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts calling `tick` every `period`, first call one period from now.
    /// A previously running timer is cancelled. `period` is capped at
    /// [`MAX_REFRESH_SECS`].
    pub fn start<F, Fut>(&self, period: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let period = period.min(Duration::from_secs(MAX_REFRESH_SECS));
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick().await {
                    break;
                }
            }
        });

        let mut active = self.lock();
        if let Some((_, previous)) = active.replace((period, handle)) {
            previous.abort();
        }
        info!(seconds = period.as_secs(), "auto refresh scheduled");
    }

    pub fn stop(&self) {
        if let Some((_, handle)) = self.lock().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    pub fn period(&self) -> Option<Duration> {
        self.lock().as_ref().map(|(period, _)| *period)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Duration, JoinHandle<()>)>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parses a refresh interval the way the settings form accepts it:
/// anything that is not a positive integer means the default.
pub fn parse_refresh_secs(raw: &str) -> u64 {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(secs) => clamp_refresh_secs(secs),
        // Digits too long for u64 are still "a very long interval".
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => {
            clamp_refresh_secs(u64::MAX)
        }
        Err(_) => DEFAULT_REFRESH_SECS,
    }
}

/// Zero means the default; anything above a day is a day.
pub fn clamp_refresh_secs(secs: u64) -> u64 {
    match secs {
        0 => DEFAULT_REFRESH_SECS,
        secs => secs.min(MAX_REFRESH_SECS),
    }
}
