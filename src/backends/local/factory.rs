// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde_json::Value;

use super::tools::*;
use crate::config::NodeConfig;
use crate::errors::FlowConfigError;
use crate::traits::Tool;

/// Factory for creating local (in-process) tool instances
pub struct LocalToolFactory;

impl LocalToolFactory {
    /// Create a tool instance from a node's configuration
    ///
    /// The `tool` field determines which tool to create:
    /// - "echo" -> EchoTool (async)
    /// - "delay" -> DelayTool (async, `seconds` option)
    /// - "change_text_case" -> ChangeTextCaseTool (`mode` option: upper, lower, proper, title)
    /// - "reverse_text" -> ReverseTextTool
    /// - "prefix_suffix_adder" -> PrefixSuffixAdderTool (`prefix` / `suffix` options)
    /// - "token_counter" -> TokenCounterTool
    pub fn create_tool(config: &NodeConfig) -> Result<Tool, FlowConfigError> {
        match config.tool.as_str() {
            "echo" => Ok(Tool::r#async(EchoTool::new())),
            "delay" => {
                let seconds = match config.options.get("seconds") {
                    None => 0.0,
                    Some(value) => value
                        .as_f64()
                        .filter(|s| s.is_finite() && *s >= 0.0)
                        .ok_or_else(|| invalid(config, "'seconds' must be a non-negative number"))?,
                };
                Ok(Tool::r#async(DelayTool::new(Duration::from_secs_f64(seconds))))
            }

            // Text manipulation tools
            "change_text_case" => {
                let mode = config
                    .options
                    .get("mode")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(config, "missing 'mode' option"))?;
                let mode = CaseMode::parse(mode).ok_or_else(|| {
                    invalid(
                        config,
                        &format!("unknown case mode '{}', expected upper, lower, proper or title", mode),
                    )
                })?;
                Ok(Tool::sync(ChangeTextCaseTool::new(mode)))
            }
            "reverse_text" => Ok(Tool::sync(ReverseTextTool::new())),
            "prefix_suffix_adder" => {
                let options = serde_json::Value::Object(
                    config.options.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                );
                let tool_config: PrefixSuffixConfig = serde_json::from_value(options)
                    .map_err(|e| invalid(config, &e.to_string()))?;
                Ok(Tool::sync(PrefixSuffixAdderTool::new(tool_config)))
            }

            // Analysis tools
            "token_counter" => Ok(Tool::sync(TokenCounterTool::new())),

            _ => Err(FlowConfigError::UnknownTool {
                node_name: config.name.clone(),
                tool: config.tool.clone(),
            }),
        }
    }

    /// List all available local tool implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "echo",
            "delay",
            "change_text_case",
            "reverse_text",
            "prefix_suffix_adder",
            "token_counter",
        ]
    }

    pub fn is_implementation_available(tool: &str) -> bool {
        Self::list_available_implementations().contains(&tool)
    }
}

fn invalid(config: &NodeConfig, reason: &str) -> FlowConfigError {
    FlowConfigError::InvalidToolOptions {
        node_name: config.name.clone(),
        reason: reason.to_string(),
    }
}
