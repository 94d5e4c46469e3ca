// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for tool invocations recorded by the execution context.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Tool invocation started.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use flowline::observability::messages::tool::ToolInvocationStarted;
///
/// let msg = ToolInvocationStarted {
///     node_name: "summarize",
///     tool_name: "echo",
///     is_async: true,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ToolInvocationStarted<'a> {
    pub node_name: &'a str,
    pub tool_name: &'a str,
    pub is_async: bool,
}

impl Display for ToolInvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let convention = if self.is_async { "async" } else { "sync" };
        write!(
            f,
            "Executing node '{}' with {} tool '{}'",
            self.node_name, convention, self.tool_name
        )
    }
}

impl StructuredLog for ToolInvocationStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_name = self.node_name,
            tool_name = self.tool_name,
            is_async = self.is_async,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "tool_invocation",
            span_name = name,
            node_name = self.node_name,
            tool_name = self.tool_name,
            is_async = self.is_async,
        )
    }
}

/// Tool invocation completed.
///
/// # Log Level
/// `info!`
pub struct ToolInvocationCompleted<'a> {
    pub node_name: &'a str,
    pub duration: std::time::Duration,
}

impl Display for ToolInvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed in {:?}",
            self.node_name, self.duration
        )
    }
}

impl StructuredLog for ToolInvocationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            node_name = self.node_name,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// Tool invocation failed.
///
/// # Log Level
/// `error!`
pub struct ToolInvocationFailed<'a> {
    pub node_name: &'a str,
    pub error: &'a (dyn std::error::Error + Send + Sync),
}

impl Display for ToolInvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' execution failed: {}",
            self.node_name, self.error
        )
    }
}

impl StructuredLog for ToolInvocationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_name = self.node_name,
            error = %self.error,
            "{}", self
        );
    }
}

/// A node was skipped and recorded without invoking its tool.
///
/// # Log Level
/// `debug!`
pub struct NodeBypassRecorded<'a> {
    pub node_name: &'a str,
}

impl Display for NodeBypassRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' recorded as bypassed", self.node_name)
    }
}

impl StructuredLog for NodeBypassRecorded<'_> {
    fn log(&self) {
        tracing::debug!(node_name = self.node_name, "{}", self);
    }
}
