// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use crate::config::consts::{
    DEFAULT_CANCEL_GRACE_PERIOD, DEFAULT_EXIT_DELAY, DEFAULT_LONG_RUNNING_LOGGING_INTERVAL_SECS,
    DEFAULT_MONITOR_POLL_INTERVAL, DEFAULT_NODE_CONCURRENCY,
    DEFAULT_WAIT_SECONDS_AFTER_CANCELLATION, LONG_RUNNING_LOGGING_INTERVAL_ENV,
    WAIT_SECONDS_AFTER_CANCELLATION_ENV,
};
use crate::config::SchedulerConfig;

/// Called with an exit code when the cancellation monitor gives up on outstanding work.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Behaviour of the post-cancellation safety net.
///
/// Blocking tools run on worker threads that cannot be interrupted. Once a
/// line is cancelled, a monitor thread waits up to `wait_after_cancellation`
/// for that work to finish and then terminates the process through
/// `exit_hook` so a stuck thread cannot keep it alive.
#[derive(Clone)]
pub struct CancellationOptions {
    pub wait_after_cancellation: Duration,
    /// Pause before exiting so pending records can be flushed.
    pub exit_delay: Duration,
    /// Disable to embed the scheduler in a host that handles shutdown itself.
    pub force_exit: bool,
    pub exit_hook: ExitHook,
}

impl Default for CancellationOptions {
    fn default() -> Self {
        Self {
            wait_after_cancellation: Duration::from_secs(DEFAULT_WAIT_SECONDS_AFTER_CANCELLATION),
            exit_delay: DEFAULT_EXIT_DELAY,
            force_exit: true,
            exit_hook: Arc::new(|code| std::process::exit(code)),
        }
    }
}

impl std::fmt::Debug for CancellationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationOptions")
            .field("wait_after_cancellation", &self.wait_after_cancellation)
            .field("exit_delay", &self.exit_delay)
            .field("force_exit", &self.force_exit)
            .finish_non_exhaustive()
    }
}

/// Tuning for [`AsyncNodesScheduler`](crate::engine::AsyncNodesScheduler).
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum concurrently admitted tool invocations, also the worker-thread bound.
    pub node_concurrency: usize,
    /// `None` disables the long-running task monitor.
    pub long_running_logging_interval: Option<Duration>,
    pub monitor_poll_interval: Duration,
    /// Time cancelled siblings get to unwind after a failure or timeout.
    pub cancel_grace_period: Duration,
    pub cancellation: CancellationOptions,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::new(default_node_concurrency())
    }
}

impl SchedulerOptions {
    /// Options with the given concurrency (clamped to at least 1) and default monitors.
    pub fn new(node_concurrency: usize) -> Self {
        Self {
            node_concurrency: node_concurrency.max(1),
            long_running_logging_interval: Some(Duration::from_secs(
                DEFAULT_LONG_RUNNING_LOGGING_INTERVAL_SECS,
            )),
            monitor_poll_interval: DEFAULT_MONITOR_POLL_INTERVAL,
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            cancellation: CancellationOptions::default(),
        }
    }

    /// Build from the `scheduler:` section of a flow file, then apply environment overrides.
    pub fn from_config(cfg: &SchedulerConfig) -> Self {
        Self::from_config_values(cfg).apply_env()
    }

    fn from_config_values(cfg: &SchedulerConfig) -> Self {
        let mut options = Self::new(cfg.node_concurrency.unwrap_or_else(default_node_concurrency));
        if let Some(secs) = cfg.long_running_logging_interval_seconds {
            // Zero turns the monitor off.
            options.long_running_logging_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = cfg.wait_seconds_after_cancellation {
            options.cancellation.wait_after_cancellation = Duration::from_secs(secs);
        }
        options
    }

    /// Apply `FLOWLINE_LONG_RUNNING_LOGGING_INTERVAL` and
    /// `FLOWLINE_WAIT_SECONDS_AFTER_CANCELLATION` if they are set.
    pub fn apply_env(self) -> Self {
        self.apply_env_values(
            std::env::var(LONG_RUNNING_LOGGING_INTERVAL_ENV).ok().as_deref(),
            std::env::var(WAIT_SECONDS_AFTER_CANCELLATION_ENV).ok().as_deref(),
        )
    }

    fn apply_env_values(mut self, interval: Option<&str>, wait: Option<&str>) -> Self {
        if let Some(raw) = interval.filter(|s| !s.is_empty()) {
            let secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    tracing::info!(
                        "Using value of {} in environment variable as logging interval: {}",
                        LONG_RUNNING_LOGGING_INTERVAL_ENV,
                        secs
                    );
                    secs
                }
                _ => {
                    tracing::warn!(
                        "Value of {} in environment variable ('{}') is invalid, use default value {}",
                        LONG_RUNNING_LOGGING_INTERVAL_ENV,
                        raw,
                        DEFAULT_LONG_RUNNING_LOGGING_INTERVAL_SECS
                    );
                    DEFAULT_LONG_RUNNING_LOGGING_INTERVAL_SECS
                }
            };
            self.long_running_logging_interval = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = wait.filter(|s| !s.is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => {
                    self.cancellation.wait_after_cancellation = Duration::from_secs(secs)
                }
                Err(_) => tracing::warn!(
                    "Value of {} in environment variable ('{}') is invalid, keeping {:?}",
                    WAIT_SECONDS_AFTER_CANCELLATION_ENV,
                    raw,
                    self.cancellation.wait_after_cancellation
                ),
            }
        }
        self
    }

    pub fn with_long_running_logging_interval(mut self, interval: Option<Duration>) -> Self {
        self.long_running_logging_interval = interval;
        self
    }

    pub fn with_monitor_poll_interval(mut self, interval: Duration) -> Self {
        self.monitor_poll_interval = interval;
        self
    }

    pub fn with_cancel_grace_period(mut self, grace: Duration) -> Self {
        self.cancel_grace_period = grace;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationOptions) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// Number of CPU cores, falling back to 4 if detection fails.
fn default_node_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_NODE_CONCURRENCY)
}
