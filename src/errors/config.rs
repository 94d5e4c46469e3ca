// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors that can occur during flow graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected between nodes
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A node references another node that doesn't exist
    UnresolvedReference {
        /// The node holding the dangling reference
        node_name: String,
        /// The referenced node name that couldn't be resolved
        missing_node: String,
    },
    /// Two nodes share the same name
    DuplicateNodeName {
        node_name: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedReference {
                node_name,
                missing_node,
            } => {
                write!(
                    f,
                    "Node '{}' references '{}' which does not exist",
                    node_name, missing_node
                )
            }
            ValidationError::DuplicateNodeName { node_name } => {
                write!(f, "Duplicate node name: '{}'", node_name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a flow definition and building its runtime.
#[derive(Debug, Error)]
pub enum FlowConfigError {
    #[error("Failed to read flow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse flow YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Flow validation failed:\n{}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Unknown tool implementation '{tool}' for node '{node_name}'")]
    UnknownTool { node_name: String, tool: String },

    #[error("Invalid options for node '{node_name}': {reason}")]
    InvalidToolOptions { node_name: String, reason: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
