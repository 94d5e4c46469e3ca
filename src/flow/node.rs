// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::BTreeMap;

use crate::flow::InputAssignment;

/// Skip rule for a node: it only runs when `condition` resolves to `condition_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivateCondition {
    pub condition: InputAssignment,
    pub condition_value: Value,
}

/// One step of a flow, bound to a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique within a flow.
    pub name: String,
    /// Tool implementation name, informational for the scheduler.
    pub tool: String,
    pub inputs: BTreeMap<String, InputAssignment>,
    pub activate: Option<ActivateCondition>,
}

impl Node {
    pub fn new(name: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool: tool.into(),
            inputs: BTreeMap::new(),
            activate: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, assignment: InputAssignment) -> Self {
        self.inputs.insert(name.into(), assignment);
        self
    }

    pub fn with_activate(mut self, condition: InputAssignment, condition_value: Value) -> Self {
        self.activate = Some(ActivateCondition {
            condition,
            condition_value,
        });
        self
    }

    /// Every node this one waits on, from its inputs and its activate condition.
    /// May contain duplicates.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .values()
            .chain(self.activate.iter().map(|a| &a.condition))
            .filter_map(InputAssignment::referenced_node)
    }

    /// Node-reference bindings among the declared inputs only.
    pub fn input_dependencies(&self) -> impl Iterator<Item = &str> {
        self.inputs.values().filter_map(InputAssignment::referenced_node)
    }
}
