// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{AsyncTool, ToolInputs, ToolSignature};

/// Returns its `value` input unchanged, or `null` when it is not bound.
pub struct EchoTool {
    signature: ToolSignature,
}

impl EchoTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new().optional("value"),
        }
    }
}

impl Default for EchoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncTool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, mut inputs: ToolInputs) -> Result<Value, ToolError> {
        Ok(inputs.remove("value").unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn echoes_value() {
        let inputs = ToolInputs::from([("value".to_string(), json!({"k": [1, 2]}))]);
        assert_eq!(EchoTool::new().call(inputs).await.unwrap(), json!({"k": [1, 2]}));
        assert_eq!(EchoTool::new().call(ToolInputs::new()).await.unwrap(), Value::Null);
    }
}
