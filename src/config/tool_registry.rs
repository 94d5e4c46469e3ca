// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::backends::local::LocalToolFactory;
use crate::config::FlowConfig;
use crate::errors::{ExecutionError, FlowConfigError};
use crate::flow::Node;
use crate::traits::Tool;

/// Node name -> tool. Read-only once built and shared by every line of a flow.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry(pub HashMap<String, Tool>);

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a tool for every node through the local tool factory.
    pub fn from_config(cfg: &FlowConfig) -> Result<Self, FlowConfigError> {
        let mut registry = Self::new();
        for node in &cfg.nodes {
            registry.insert(&node.name, LocalToolFactory::create_tool(node)?);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, node_name: impl Into<String>, tool: Tool) {
        self.0.insert(node_name.into(), tool);
    }

    pub fn with_tool(mut self, node_name: impl Into<String>, tool: Tool) -> Self {
        self.insert(node_name, tool);
        self
    }

    pub fn get_tool(&self, node: &Node) -> Result<Tool, ExecutionError> {
        self.0
            .get(&node.name)
            .cloned()
            .ok_or_else(|| ExecutionError::ToolNotFound(node.name.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::FixedTool;
    use serde_json::json;

    #[test]
    fn missing_tool_is_reported_by_node_name() {
        let registry = ToolRegistry::new().with_tool("known", Tool::r#async(FixedTool::new(json!(1))));

        assert!(registry.get_tool(&Node::new("known", "fixed")).is_ok());
        let err = registry.get_tool(&Node::new("unknown", "fixed")).unwrap_err();
        assert!(matches!(err, ExecutionError::ToolNotFound(name) if name == "unknown"));
    }
}
