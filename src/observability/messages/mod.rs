// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with structured fields at the
//! level the message belongs to.
//!
//! # Organization
//!
//! * `engine` - line execution lifecycle, timeouts, failures and cancellation
//! * `dag` - readiness and bypass decisions
//! * `monitor` - long-running task reports and the post-cancellation monitor
//! * `tool` - tool invocation events recorded by the execution context
//! * `validation` - flow validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use flowline::observability::messages::{engine::LineExecutionStarted, StructuredLog};
//!
//! let msg = LineExecutionStarted {
//!     line_number: Some(0),
//!     node_count: 5,
//!     node_concurrency: 4,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod dag;
pub mod engine;
pub mod monitor;
pub mod tool;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, _name: &str) -> Span {
        Span::none()
    }
}

/// Render an optional line number for log output.
pub(crate) fn line_label(line_number: Option<usize>) -> String {
    line_number.map_or_else(|| "<unknown>".to_string(), |n| n.to_string())
}
