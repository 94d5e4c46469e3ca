// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for readiness and bypass decisions.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Why a node is skipped.
pub enum BypassReason<'a> {
    /// The node named in the activate condition was itself bypassed.
    ConditionSourceBypassed { source: &'a str },
    /// The activate condition resolved to something other than the expected value.
    ConditionNotMet { condition: &'a str, expected: &'a serde_json::Value },
    /// Every node the inputs reference was bypassed.
    AllDependenciesBypassed { dependencies: &'a [&'a str] },
}

impl Display for BypassReason<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            BypassReason::ConditionSourceBypassed { source } => write!(
                f,
                "it depends on the node '{}' which has already been bypassed in the activate config",
                source
            ),
            BypassReason::ConditionNotMet { condition, expected } => write!(
                f,
                "the activate condition is not met, i.e. '{}' is not equal to '{}'",
                condition, expected
            ),
            BypassReason::AllDependenciesBypassed { dependencies } => write!(
                f,
                "all nodes {:?} it depends on are bypassed",
                dependencies
            ),
        }
    }
}

/// A node will be bypassed.
///
/// # Log Level
/// `info!`
pub struct NodeBypassed<'a> {
    pub node_name: &'a str,
    pub reason: BypassReason<'a>,
}

impl Display for NodeBypassed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "The node '{}' will be bypassed because {}",
            self.node_name, self.reason
        )
    }
}

impl StructuredLog for NodeBypassed<'_> {
    fn log(&self) {
        tracing::info!(node_name = self.node_name, "{}", self);
    }
}

/// A node's activate condition is met and it will run.
///
/// # Log Level
/// `info!`
pub struct NodeActivated<'a> {
    pub node_name: &'a str,
    pub condition: &'a str,
    pub expected: &'a serde_json::Value,
}

impl Display for NodeActivated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "The node '{}' will be executed because the activate condition is met, i.e. '{}' is equal to '{}'",
            self.node_name, self.condition, self.expected
        )
    }
}

impl StructuredLog for NodeActivated<'_> {
    fn log(&self) {
        tracing::info!(node_name = self.node_name, "{}", self);
    }
}

/// An input bound to a bypassed node has no default and is passed as null.
///
/// # Log Level
/// `warn!`
pub struct BypassedInputDefaulted<'a> {
    pub node_name: &'a str,
    pub input: &'a str,
    pub referenced_node: &'a str,
}

impl Display for BypassedInputDefaulted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "The node '{}' referenced by the input '{}' of the current node '{}' has been bypassed, \
             and no default value is set. Will use 'null' as the value for this input",
            self.referenced_node, self.input, self.node_name
        )
    }
}

impl StructuredLog for BypassedInputDefaulted<'_> {
    fn log(&self) {
        tracing::warn!(
            node_name = self.node_name,
            input = self.input,
            referenced_node = self.referenced_node,
            "{}", self
        );
    }
}

/// A binding that the tool does not declare was dropped.
///
/// # Log Level
/// `debug!`
pub struct InputDropped<'a> {
    pub node_name: &'a str,
    pub input: &'a str,
    pub tool_name: &'a str,
}

impl Display for InputDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping input '{}' of node '{}': tool '{}' does not accept it",
            self.input, self.node_name, self.tool_name
        )
    }
}

impl StructuredLog for InputDropped<'_> {
    fn log(&self) {
        tracing::debug!(
            node_name = self.node_name,
            input = self.input,
            tool_name = self.tool_name,
            "{}", self
        );
    }
}
