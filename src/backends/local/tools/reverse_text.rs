// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use super::text_input;
use crate::errors::ToolError;
use crate::traits::{SyncTool, ToolInputs, ToolSignature};

/// Reverses the `text` input by characters.
pub struct ReverseTextTool {
    signature: ToolSignature,
}

impl ReverseTextTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new().required("text"),
        }
    }
}

impl Default for ReverseTextTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTool for ReverseTextTool {
    fn name(&self) -> &str {
        "reverse_text"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError> {
        let text = text_input(&inputs, "text")?;
        Ok(Value::String(text.chars().rev().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reverses_unicode_by_char() {
        let inputs = ToolInputs::from([("text".to_string(), json!("héllo"))]);
        assert_eq!(ReverseTextTool::new().call(inputs).unwrap(), json!("olléh"));
    }
}
