// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures while resolving a node's declared input bindings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("The flow input '{input}' is not provided")]
    FlowInputNotFound { input: String },

    #[error("The output of node '{node}' is not available yet")]
    NodeOutputNotFound { node: String },

    #[error("Reference '{reference}' uses unsupported section '{section}', only 'output' is supported")]
    UnsupportedReferenceSection { reference: String, section: String },

    #[error("Reference '{reference}' has no property '{segment}'")]
    InvalidReferenceProperty { reference: String, segment: String },

    #[error("Node '{node_name}' is missing a value for required input '{parameter}'")]
    MissingRequiredInput { node_name: String, parameter: String },
}
