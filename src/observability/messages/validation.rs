// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for flow validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Flow validation passed.
///
/// # Log Level
/// `debug!`
pub struct ValidationCompleted {
    pub node_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Flow validation passed for {} nodes", self.node_count)
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::debug!(node_count = self.node_count, "{}", self);
    }
}

/// Flow validation failed.
///
/// # Log Level
/// `error!`
pub struct ValidationFailed<'a> {
    pub errors: &'a [ValidationError],
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Flow validation failed with {} errors", self.errors.len())?;
        for error in self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(error_count = self.errors.len(), "{}", self);
    }
}
