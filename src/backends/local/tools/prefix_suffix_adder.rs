// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::text_input;
use crate::errors::ToolError;
use crate::traits::{SyncTool, ToolInputs, ToolSignature};

/// Options for [`PrefixSuffixAdderTool`], read from the node's `options:` block.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrefixSuffixConfig {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Wraps the `text` input with a configured prefix and/or suffix.
pub struct PrefixSuffixAdderTool {
    config: PrefixSuffixConfig,
    signature: ToolSignature,
}

impl PrefixSuffixAdderTool {
    pub fn new(config: PrefixSuffixConfig) -> Self {
        Self {
            config,
            signature: ToolSignature::new().required("text"),
        }
    }

    pub fn with_prefix_and_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: Some(prefix.into()),
            suffix: Some(suffix.into()),
        })
    }
}

impl SyncTool for PrefixSuffixAdderTool {
    fn name(&self) -> &str {
        "prefix_suffix_adder"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError> {
        let text = text_input(&inputs, "text")?;

        let mut result = String::new();
        if let Some(prefix) = &self.config.prefix {
            result.push_str(prefix);
        }
        result.push_str(text);
        if let Some(suffix) = &self.config.suffix {
            result.push_str(suffix);
        }

        Ok(Value::String(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_text() {
        let tool = PrefixSuffixAdderTool::with_prefix_and_suffix("[", "]");
        let inputs = ToolInputs::from([("text".to_string(), json!("core"))]);
        assert_eq!(tool.call(inputs).unwrap(), json!("[core]"));
    }

    #[test]
    fn prefix_only() {
        let tool = PrefixSuffixAdderTool::new(PrefixSuffixConfig {
            prefix: Some(">> ".to_string()),
            suffix: None,
        });
        let inputs = ToolInputs::from([("text".to_string(), json!("note"))]);
        assert_eq!(tool.call(inputs).unwrap(), json!(">> note"));
    }
}
