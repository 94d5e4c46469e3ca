// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{AsyncTool, ToolInputs, ToolSignature};

/// Sleeps for a configured duration, then returns its `value` input.
pub struct DelayTool {
    delay: Duration,
    signature: ToolSignature,
}

impl DelayTool {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            signature: ToolSignature::new().optional("value"),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl AsyncTool for DelayTool {
    fn name(&self) -> &str {
        "delay"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, mut inputs: ToolInputs) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(inputs.remove("value").unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn sleeps_then_returns_value() {
        let tool = DelayTool::new(Duration::from_millis(50));
        let started = std::time::Instant::now();
        let inputs = ToolInputs::from([("value".to_string(), json!("late"))]);

        assert_eq!(tool.call(inputs).await.unwrap(), json!("late"));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
