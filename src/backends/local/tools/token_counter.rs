// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::Value;

use super::{text_input, LocalToolError};
use crate::errors::ToolError;
use crate::traits::{SyncTool, ToolInputs, ToolSignature};

/// Counts characters, words and lines of the `text` input.
pub struct TokenCounterTool {
    signature: ToolSignature,
}

#[derive(Serialize)]
struct TokenCountResult {
    char_count: usize,
    word_count: usize,
    line_count: usize,
}

impl TokenCounterTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new().required("text"),
        }
    }
}

impl Default for TokenCounterTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTool for TokenCounterTool {
    fn name(&self) -> &str {
        "token_counter"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError> {
        let text = text_input(&inputs, "text")?;

        let result = TokenCountResult {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            line_count: text.lines().count().max(1), // At least 1 line even if empty
        };

        Ok(serde_json::to_value(result).map_err(LocalToolError::from)?)
    }
}
