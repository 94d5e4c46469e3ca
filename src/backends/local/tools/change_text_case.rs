// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::text_input;
use crate::errors::ToolError;
use crate::traits::{SyncTool, ToolInputs, ToolSignature};

/// Target case for [`ChangeTextCaseTool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    Upper,
    Lower,
    /// First letter of every word capitalized.
    Proper,
    /// Like `Proper`, but short articles and prepositions stay lowercase after the first word.
    Title,
}

impl CaseMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "upper" => Some(CaseMode::Upper),
            "lower" => Some(CaseMode::Lower),
            "proper" => Some(CaseMode::Proper),
            "title" => Some(CaseMode::Title),
            _ => None,
        }
    }
}

/// Converts the `text` input to another case.
pub struct ChangeTextCaseTool {
    mode: CaseMode,
    signature: ToolSignature,
}

impl ChangeTextCaseTool {
    pub fn new(mode: CaseMode) -> Self {
        Self {
            mode,
            signature: ToolSignature::new().required("text"),
        }
    }

    pub fn upper() -> Self {
        Self::new(CaseMode::Upper)
    }

    pub fn lower() -> Self {
        Self::new(CaseMode::Lower)
    }

    pub fn title() -> Self {
        Self::new(CaseMode::Title)
    }

    pub fn convert(&self, input: &str) -> String {
        match self.mode {
            CaseMode::Upper => input.to_uppercase(),
            CaseMode::Lower => input.to_lowercase(),
            CaseMode::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseMode::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower_word = word.to_lowercase();
                    if i > 0 && is_minor_word(&lower_word) {
                        lower_word
                    } else {
                        capitalize(word)
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_minor_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

impl SyncTool for ChangeTextCaseTool {
    fn name(&self) -> &str {
        "change_text_case"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError> {
        let text = text_input(&inputs, "text")?;
        Ok(Value::String(self.convert(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_every_mode() {
        let cases = vec![
            (CaseMode::Upper, "hello", "HELLO"),
            (CaseMode::Lower, "HELLO", "hello"),
            (CaseMode::Proper, "hello wORLD", "Hello World"),
            (CaseMode::Title, "the quick brown fox of the woods", "The Quick Brown Fox of the Woods"),
        ];

        for (mode, input, expected) in cases {
            assert_eq!(ChangeTextCaseTool::new(mode).convert(input), expected, "mode {:?}", mode);
        }
    }

    #[test]
    fn non_string_input_is_rejected() {
        let inputs = ToolInputs::from([("text".to_string(), json!(42))]);
        let err = ChangeTextCaseTool::upper().call(inputs).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }
}
