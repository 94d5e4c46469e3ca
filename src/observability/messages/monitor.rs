// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the stall and cancellation monitors.

use crate::observability::messages::StructuredLog;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// The stall monitor thread started for a line.
///
/// # Log Level
/// `debug!`
pub struct StallMonitorStarted {
    pub interval: Duration,
}

impl Display for StallMonitorStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Long running task monitor started, interval={:?}", self.interval)
    }
}

impl StructuredLog for StallMonitorStarted {
    fn log(&self) {
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "{}", self);
    }
}

/// A node task has been running longer than the logging interval.
///
/// # Log Level
/// `warn!` - Possible hang
pub struct LongRunningTask<'a> {
    pub node_name: &'a str,
    pub elapsed: Duration,
    pub spawn_trace: &'a Backtrace,
}

impl Display for LongRunningTask<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {} has been running for {:.0} seconds",
            self.node_name,
            self.elapsed.as_secs_f64()
        )?;
        match self.spawn_trace.status() {
            BacktraceStatus::Captured => {
                write!(f, ", spawned from:\n{}", self.spawn_trace)
            }
            // Async tasks expose no live stack; without RUST_BACKTRACE there is nothing more to show.
            _ => write!(f, " (stack capture unavailable, set RUST_BACKTRACE=1 to record spawn sites)"),
        }
    }
}

impl StructuredLog for LongRunningTask<'_> {
    fn log(&self) {
        tracing::warn!(
            node_name = self.node_name,
            elapsed_secs = self.elapsed.as_secs(),
            "{}", self
        );
    }
}

/// Cancellation was observed; the process-exit safety net is armed.
///
/// # Log Level
/// `info!`
pub struct CancellationMonitorStarted {
    pub max_wait: Duration,
}

impl Display for CancellationMonitorStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Start to monitor tasks after cancellation, max wait: {:?}",
            self.max_wait
        )
    }
}

impl StructuredLog for CancellationMonitorStarted {
    fn log(&self) {
        tracing::info!(max_wait_ms = self.max_wait.as_millis() as u64, "{}", self);
    }
}

/// Every task reached a terminal state after cancellation.
///
/// # Log Level
/// `info!`
pub struct AllTasksDoneAfterCancellation;

impl Display for AllTasksDoneAfterCancellation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "All tasks are done after cancellation. Exiting")
    }
}

impl StructuredLog for AllTasksDoneAfterCancellation {
    fn log(&self) {
        tracing::info!("{}", self);
    }
}

/// The grace window elapsed with work still running.
///
/// # Log Level
/// `warn!`
pub struct TasksOutstandingAfterCancellation<'a> {
    pub max_wait: Duration,
    pub remaining: &'a [String],
}

impl Display for TasksOutstandingAfterCancellation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Not all tasks are done within {:?} after cancellation. Exiting the process despite them. \
             Set FLOWLINE_WAIT_SECONDS_AFTER_CANCELLATION if your tool needs more time to clean up. \
             Remaining tasks: [{}]",
            self.max_wait,
            self.remaining.join(", ")
        )
    }
}

impl StructuredLog for TasksOutstandingAfterCancellation<'_> {
    fn log(&self) {
        tracing::warn!(
            max_wait_ms = self.max_wait.as_millis() as u64,
            remaining = ?self.remaining,
            "{}", self
        );
    }
}
