// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::errors::InputError;
use crate::flow::{FlowInputs, NodeOutputs};

/// Prefixes that mark a `${...}` reference as a flow input.
pub const FLOW_INPUT_PREFIXES: [&str; 2] = ["inputs.", "flow."];

/// The only node section a reference may read from.
pub const OUTPUT_SECTION: &str = "output";

/// Where a node input (or an activate condition) takes its value from.
///
/// Written in flow files as:
/// * any plain value -> `Literal`
/// * `${inputs.question}` or `${flow.question}` -> `FlowInput`
/// * `${summarize}`, `${summarize.output}` or `${summarize.output.text}` -> `NodeReference`
#[derive(Debug, Clone, PartialEq)]
pub enum InputAssignment {
    Literal(Value),
    FlowInput(String),
    NodeReference {
        node: String,
        section: String,
        property: Option<String>,
    },
}

impl InputAssignment {
    pub fn node_reference(node: impl Into<String>) -> Self {
        InputAssignment::NodeReference {
            node: node.into(),
            section: OUTPUT_SECTION.to_string(),
            property: None,
        }
    }

    pub fn flow_input(name: impl Into<String>) -> Self {
        InputAssignment::FlowInput(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        InputAssignment::Literal(value.into())
    }

    /// Parse a raw binding as it appears in a flow definition.
    pub fn parse(raw: &Value) -> Self {
        let Value::String(text) = raw else {
            return InputAssignment::Literal(raw.clone());
        };
        if !text.starts_with('$') || text.len() <= 2 {
            return InputAssignment::Literal(raw.clone());
        }
        let inner = &text[1..];
        if !inner.starts_with('{') || !inner.ends_with('}') || inner.len() < 2 {
            return InputAssignment::Literal(raw.clone());
        }
        Self::parse_reference(&inner[1..inner.len() - 1])
    }

    fn parse_reference(reference: &str) -> Self {
        for prefix in FLOW_INPUT_PREFIXES {
            if let Some(name) = reference.strip_prefix(prefix) {
                return InputAssignment::FlowInput(name.to_string());
            }
        }

        let Some((node, port)) = reference.split_once('.') else {
            return Self::node_reference(reference);
        };
        match port.split_once('.') {
            None => InputAssignment::NodeReference {
                node: node.to_string(),
                section: port.to_string(),
                property: None,
            },
            Some((section, property)) => InputAssignment::NodeReference {
                node: node.to_string(),
                section: section.to_string(),
                property: Some(property.to_string()),
            },
        }
    }

    /// Render back to flow-file syntax.
    pub fn serialize(&self) -> Value {
        match self {
            InputAssignment::Literal(value) => value.clone(),
            InputAssignment::FlowInput(name) => {
                Value::String(format!("${{{}{}}}", FLOW_INPUT_PREFIXES[0], name))
            }
            InputAssignment::NodeReference {
                node,
                section,
                property: Some(property),
            } => Value::String(format!("${{{}.{}.{}}}", node, section, property)),
            InputAssignment::NodeReference {
                node,
                section,
                property: None,
            } => Value::String(format!("${{{}.{}}}", node, section)),
        }
    }

    /// Name of the node this binding depends on, if any.
    pub fn referenced_node(&self) -> Option<&str> {
        match self {
            InputAssignment::NodeReference { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Resolve against completed node outputs and the line's flow inputs.
    pub fn resolve(
        &self,
        node_outputs: &NodeOutputs,
        flow_inputs: &FlowInputs,
    ) -> Result<Value, InputError> {
        match self {
            InputAssignment::Literal(value) => Ok(value.clone()),
            InputAssignment::FlowInput(name) => {
                flow_inputs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| InputError::FlowInputNotFound {
                        input: name.clone(),
                    })
            }
            InputAssignment::NodeReference {
                node,
                section,
                property,
            } => {
                if section != OUTPUT_SECTION {
                    return Err(InputError::UnsupportedReferenceSection {
                        reference: self.reference_text(),
                        section: section.clone(),
                    });
                }
                let output = node_outputs
                    .get(node)
                    .ok_or_else(|| InputError::NodeOutputNotFound { node: node.clone() })?;
                match property {
                    None => Ok(output.clone()),
                    Some(path) => self.walk_property(output, path),
                }
            }
        }
    }

    fn walk_property(&self, output: &Value, path: &str) -> Result<Value, InputError> {
        let mut current = output;
        for segment in path.split('.') {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| InputError::InvalidReferenceProperty {
                reference: self.reference_text(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current.clone())
    }

    fn reference_text(&self) -> String {
        match self.serialize() {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_values_are_literals() {
        assert_eq!(InputAssignment::parse(&json!(42)), InputAssignment::Literal(json!(42)));
        assert_eq!(
            InputAssignment::parse(&json!("hello")),
            InputAssignment::Literal(json!("hello"))
        );
        // Not wrapped in braces, or too short to hold a reference.
        assert_eq!(InputAssignment::parse(&json!("$abc")), InputAssignment::Literal(json!("$abc")));
        assert_eq!(InputAssignment::parse(&json!("${")), InputAssignment::Literal(json!("${")));
    }

    #[test]
    fn flow_inputs_accept_both_prefixes() {
        assert_eq!(
            InputAssignment::parse(&json!("${inputs.question}")),
            InputAssignment::flow_input("question")
        );
        assert_eq!(
            InputAssignment::parse(&json!("${flow.question}")),
            InputAssignment::flow_input("question")
        );
    }

    #[test]
    fn node_references_default_to_output_section() {
        assert_eq!(
            InputAssignment::parse(&json!("${summarize}")),
            InputAssignment::node_reference("summarize")
        );
        assert_eq!(
            InputAssignment::parse(&json!("${summarize.output.text.0}")),
            InputAssignment::NodeReference {
                node: "summarize".to_string(),
                section: "output".to_string(),
                property: Some("text.0".to_string()),
            }
        );
    }

    #[test]
    fn references_survive_serialization() {
        for raw in ["${inputs.q}", "${a.output}", "${a.output.items.1}"] {
            let parsed = InputAssignment::parse(&json!(raw));
            assert_eq!(InputAssignment::parse(&parsed.serialize()), parsed);
        }
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let outputs = NodeOutputs::from([(
            "search".to_string(),
            json!({"hits": [{"title": "first"}, {"title": "second"}]}),
        )]);
        let binding = InputAssignment::parse(&json!("${search.output.hits.1.title}"));
        assert_eq!(binding.resolve(&outputs, &FlowInputs::new()), Ok(json!("second")));

        let missing = InputAssignment::parse(&json!("${search.output.hits.7}"));
        assert!(matches!(
            missing.resolve(&outputs, &FlowInputs::new()),
            Err(InputError::InvalidReferenceProperty { segment, .. }) if segment == "7"
        ));
    }

    #[test]
    fn resolve_reports_missing_sources() {
        let empty = NodeOutputs::new();
        assert_eq!(
            InputAssignment::flow_input("q").resolve(&empty, &FlowInputs::new()),
            Err(InputError::FlowInputNotFound { input: "q".to_string() })
        );
        assert_eq!(
            InputAssignment::node_reference("a").resolve(&empty, &FlowInputs::new()),
            Err(InputError::NodeOutputNotFound { node: "a".to_string() })
        );

        let outputs = NodeOutputs::from([("a".to_string(), json!(1))]);
        let wrong_section = InputAssignment::parse(&json!("${a.inputs}"));
        assert!(matches!(
            wrong_section.resolve(&outputs, &FlowInputs::new()),
            Err(InputError::UnsupportedReferenceSection { .. })
        ));
    }
}
