// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for line execution lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Line execution start and completion
//! * Line timeout and node failure
//! * Scheduler invariant violations (no progress)
//! * Cancellation requests

use crate::observability::messages::{line_label, StructuredLog};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Line execution started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use flowline::observability::messages::engine::LineExecutionStarted;
///
/// let msg = LineExecutionStarted {
///     line_number: Some(2),
///     node_count: 5,
///     node_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct LineExecutionStarted {
    pub line_number: Option<usize>,
    pub node_count: usize,
    pub node_concurrency: usize,
}

impl Display for LineExecutionStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Start to run {} nodes for line {} with node_concurrency={}",
            self.node_count,
            line_label(self.line_number),
            self.node_concurrency
        )
    }
}

impl StructuredLog for LineExecutionStarted {
    fn log(&self) {
        tracing::info!(
            line_number = ?self.line_number,
            node_count = self.node_count,
            node_concurrency = self.node_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "line_execution",
            span_name = name,
            line_number = ?self.line_number,
            node_count = self.node_count,
            node_concurrency = self.node_concurrency,
        )
    }
}

/// Line execution completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LineExecutionCompleted {
    pub line_number: Option<usize>,
    pub completed_count: usize,
    pub bypassed_count: usize,
    pub duration: Duration,
}

impl Display for LineExecutionCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Line {} completed: {} nodes executed, {} bypassed in {:?}",
            line_label(self.line_number),
            self.completed_count,
            self.bypassed_count,
            self.duration
        )
    }
}

impl StructuredLog for LineExecutionCompleted {
    fn log(&self) {
        tracing::info!(
            line_number = ?self.line_number,
            completed_count = self.completed_count,
            bypassed_count = self.bypassed_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// The line exceeded its wall-clock budget.
///
/// # Log Level
/// `warn!` - The caller receives an error, the process is healthy
pub struct LineExecutionTimedOut<'a> {
    pub line_number: Option<usize>,
    pub timeout: Duration,
    pub outstanding: &'a [String],
}

impl Display for LineExecutionTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Line {} execution timeout after {:?}, cancelling outstanding nodes: [{}]",
            line_label(self.line_number),
            self.timeout,
            self.outstanding.join(", ")
        )
    }
}

impl StructuredLog for LineExecutionTimedOut<'_> {
    fn log(&self) {
        tracing::warn!(
            line_number = ?self.line_number,
            timeout_ms = self.timeout.as_millis() as u64,
            outstanding = ?self.outstanding,
            "{}", self
        );
    }
}

/// A node task failed, aborting the line.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use flowline::observability::messages::engine::NodeTaskFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "rate limited");
/// let msg = NodeTaskFailed {
///     node_name: "summarize",
///     error: &error,
///     outstanding: &[],
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct NodeTaskFailed<'a> {
    pub node_name: &'a str,
    pub error: &'a dyn std::error::Error,
    pub outstanding: &'a [String],
}

impl Display for NodeTaskFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' failed: {}. Cancelling {} outstanding nodes",
            self.node_name,
            self.error,
            self.outstanding.len()
        )
    }
}

impl StructuredLog for NodeTaskFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_name = self.node_name,
            error = %self.error,
            outstanding = ?self.outstanding,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_task_failed",
            span_name = name,
            node_name = self.node_name,
            error = %self.error,
        )
    }
}

/// An iteration found nothing ready, running or bypassable while nodes are pending.
///
/// # Log Level
/// `error!` - Internal invariant violation, the node graph is malformed
pub struct NoProgressDetected<'a> {
    pub line_number: Option<usize>,
    pub pending: &'a [String],
    pub completed_count: usize,
    pub bypassed_count: usize,
}

impl Display for NoProgressDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Line {} cannot make progress: pending nodes [{}] never became ready ({} completed, {} bypassed). \
             Check the flow for cyclic or dangling node references",
            line_label(self.line_number),
            self.pending.join(", "),
            self.completed_count,
            self.bypassed_count
        )
    }
}

impl StructuredLog for NoProgressDetected<'_> {
    fn log(&self) {
        tracing::error!(
            line_number = ?self.line_number,
            pending = ?self.pending,
            completed_count = self.completed_count,
            bypassed_count = self.bypassed_count,
            "{}", self
        );
    }
}

/// The caller cancelled the line.
///
/// # Log Level
/// `info!` - Requested by the user
pub struct CancellationRequested<'a> {
    pub line_number: Option<usize>,
    pub outstanding: &'a [String],
}

impl Display for CancellationRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cancel requested for line {}, cancelling outstanding nodes: [{}]",
            line_label(self.line_number),
            self.outstanding.join(", ")
        )
    }
}

impl StructuredLog for CancellationRequested<'_> {
    fn log(&self) {
        tracing::info!(
            line_number = ?self.line_number,
            outstanding = ?self.outstanding,
            "{}", self
        );
    }
}
