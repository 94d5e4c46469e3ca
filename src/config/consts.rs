use std::time::Duration;

/// Fallback when the host's available parallelism can't be detected.
pub const DEFAULT_NODE_CONCURRENCY: usize = 4;
/// Default interval between long-running task reports.
pub const DEFAULT_LONG_RUNNING_LOGGING_INTERVAL_SECS: u64 = 60;
/// Default grace window before forcing exit after cancellation.
pub const DEFAULT_WAIT_SECONDS_AFTER_CANCELLATION: u64 = 30;
/// Best-effort pause before a forced exit so pending log/run records can flush.
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_secs(3);
/// How often the background monitors wake up.
pub const DEFAULT_MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// How long cancelled sibling tasks get to unwind before an error is surfaced.
pub const DEFAULT_CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(1);

pub const LONG_RUNNING_LOGGING_INTERVAL_ENV: &str = "FLOWLINE_LONG_RUNNING_LOGGING_INTERVAL";
pub const WAIT_SECONDS_AFTER_CANCELLATION_ENV: &str = "FLOWLINE_WAIT_SECONDS_AFTER_CANCELLATION";
pub const LOG_FILTER_ENV: &str = "FLOWLINE_LOG";
