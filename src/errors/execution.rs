// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced by a single line's DAG execution.

use std::time::Duration;
use thiserror::Error;

use crate::errors::InputError;

/// Opaque error returned by a tool implementation.
///
/// The scheduler never classifies these; it only reports which node failed.
pub type ToolError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The line's total wall-clock budget was exceeded.
    #[error(
        "Line {} execution timeout for exceeding {} seconds",
        display_line(.line_number),
        .timeout.as_secs_f64()
    )]
    LineExecutionTimeout {
        line_number: Option<usize>,
        timeout: Duration,
    },

    /// Nothing is ready, running or bypassable but the DAG is incomplete.
    /// Indicates a malformed or cyclic node list.
    #[error(
        "No nodes are ready for execution, but the flow is not completed. Pending nodes: [{}]",
        .pending.join(", ")
    )]
    NoNodeExecuted { pending: Vec<String> },

    #[error("Tool execution failed for node '{node_name}': {source}")]
    ToolExecutionFailed {
        node_name: String,
        #[source]
        source: ToolError,
    },

    #[error("Tool for node '{node_name}' panicked during execution")]
    ToolPanicked { node_name: String },

    #[error("No tool is registered for node '{0}'")]
    ToolNotFound(String),

    #[error(transparent)]
    InputResolution(#[from] InputError),

    /// The caller requested cancellation. Not a failure of the flow itself.
    #[error("Line {} execution was cancelled", display_line(.line_number))]
    Cancelled { line_number: Option<usize> },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ExecutionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::LineExecutionTimeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled { .. })
    }
}

fn display_line(line_number: &Option<usize>) -> String {
    match line_number {
        Some(n) => n.to_string(),
        None => "<unknown>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_carries_line_and_budget() {
        let err = ExecutionError::LineExecutionTimeout {
            line_number: Some(3),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(
            err.to_string(),
            "Line 3 execution timeout for exceeding 10 seconds"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn unknown_line_is_rendered_explicitly() {
        let err = ExecutionError::Cancelled { line_number: None };
        assert_eq!(err.to_string(), "Line <unknown> execution was cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn tool_failure_keeps_source() {
        let source: ToolError = "boom".into();
        let err = ExecutionError::ToolExecutionFailed {
            node_name: "llm".to_string(),
            source,
        };
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "boom");
    }
}
