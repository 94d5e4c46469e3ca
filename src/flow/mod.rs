// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Static flow model: nodes, their input bindings and activation conditions.
//!
//! Everything here is immutable once a flow is loaded and is shared read-only
//! across concurrently executing lines.

mod input_assignment;
mod node;

pub use input_assignment::{InputAssignment, FLOW_INPUT_PREFIXES, OUTPUT_SECTION};
pub use node::{ActivateCondition, Node};

use serde_json::Value;
use std::collections::HashMap;

/// Resolved flow-level inputs for a single line.
pub type FlowInputs = HashMap<String, Value>;

/// Node name -> output value for every completed (or bypassed) node.
pub type NodeOutputs = HashMap<String, Value>;
