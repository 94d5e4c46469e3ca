// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod delay;
pub mod echo;
pub mod prefix_suffix_adder;
pub mod reverse_text;
pub mod token_counter;

pub use change_text_case::*;
pub use delay::*;
pub use echo::*;
pub use prefix_suffix_adder::*;
pub use reverse_text::*;
pub use token_counter::*;

use serde_json::Value;
use thiserror::Error;

use crate::traits::ToolInputs;

/// Errors raised by the built-in local tools.
#[derive(Debug, Error)]
pub enum LocalToolError {
    #[error("Input '{name}' must be a string, got {found}")]
    ExpectedString { name: String, found: Value },

    #[error("Input '{0}' is missing")]
    MissingInput(String),

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fetch a string input by name.
pub(crate) fn text_input<'a>(inputs: &'a ToolInputs, name: &str) -> Result<&'a str, LocalToolError> {
    match inputs.get(name) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(LocalToolError::ExpectedString {
            name: name.to_string(),
            found: other.clone(),
        }),
        None => Err(LocalToolError::MissingInput(name.to_string())),
    }
}
