// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::FlowConfigError;
use crate::flow::{ActivateCondition, InputAssignment, Node};
use crate::observability::messages::validation::{ValidationCompleted, ValidationFailed};
use crate::observability::messages::StructuredLog;

/// A flow definition: scheduler tuning plus the node list.
///
/// # Example
/// ```yaml
/// scheduler:
///   node_concurrency: 4
///   line_timeout_seconds: 600
/// nodes:
///   - name: classify
///     tool: change_text_case
///     options:
///       mode: lower
///     inputs:
///       text: ${inputs.question}
///   - name: answer
///     tool: echo
///     inputs:
///       value: ${inputs.question}
///     activate:
///       when: ${classify.output}
///       is: "qa"
/// ```
#[derive(Debug, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub nodes: Vec<NodeConfig>,
}

/// The `scheduler:` section. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct SchedulerConfig {
    pub node_concurrency: Option<usize>,
    pub line_timeout_seconds: Option<u64>,
    pub long_running_logging_interval_seconds: Option<u64>,
    pub wait_seconds_after_cancellation: Option<u64>,
}

/// Configuration for a single node.
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    /// Local tool implementation, see [`LocalToolFactory`](crate::backends::local::LocalToolFactory).
    pub tool: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    /// Tool-specific construction options.
    #[serde(default)]
    pub options: HashMap<String, Value>,
    pub activate: Option<ActivateConfig>,
}

/// `activate: { when: <binding>, is: <value> }`
#[derive(Debug, Deserialize)]
pub struct ActivateConfig {
    pub when: Value,
    #[serde(rename = "is")]
    pub is_value: Value,
}

impl NodeConfig {
    pub fn to_node(&self) -> Node {
        let mut node = Node::new(&self.name, &self.tool);
        for (name, raw) in &self.inputs {
            node = node.with_input(name, InputAssignment::parse(raw));
        }
        if let Some(activate) = &self.activate {
            node.activate = Some(ActivateCondition {
                condition: InputAssignment::parse(&activate.when),
                condition_value: activate.is_value.clone(),
            });
        }
        node
    }
}

impl FlowConfig {
    /// The immutable node list, shareable across lines.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.iter().map(|n| Arc::new(n.to_node())).collect()
    }

    pub fn line_timeout(&self) -> Option<Duration> {
        self.scheduler.line_timeout_seconds.map(Duration::from_secs)
    }
}

/// Load a flow from a YAML file
pub fn load_flow<P: AsRef<Path>>(path: P) -> Result<FlowConfig, FlowConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: FlowConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a flow from a YAML file
///
/// Node names must be unique, every node reference must resolve and the
/// graph must be acyclic. All problems are reported together.
pub fn load_and_validate_flow<P: AsRef<Path>>(path: P) -> Result<FlowConfig, FlowConfigError> {
    let cfg = load_flow(path)?;
    let nodes = cfg.nodes();

    if let Err(validation_errors) = crate::config::validate_flow_graph(&nodes) {
        ValidationFailed {
            errors: &validation_errors,
        }
        .log();
        return Err(FlowConfigError::Validation(validation_errors));
    }
    ValidationCompleted {
        node_count: nodes.len(),
    }
    .log();

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_flow(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_flow() {
        let yaml = r#"
nodes:
  - name: upper
    tool: change_text_case
    options:
      mode: upper
    inputs:
      text: ${inputs.text}
  - name: reverse
    tool: reverse_text
    inputs:
      text: ${upper.output}
"#;

        let cfg: FlowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.nodes.len(), 2);
        assert_eq!(cfg.nodes[0].options.get("mode"), Some(&json!("upper")));
        assert!(cfg.scheduler.node_concurrency.is_none());

        let nodes = cfg.nodes();
        assert_eq!(
            nodes[1].inputs.get("text"),
            Some(&InputAssignment::node_reference("upper"))
        );
        assert_eq!(
            nodes[0].inputs.get("text"),
            Some(&InputAssignment::flow_input("text"))
        );
    }

    #[test]
    fn parse_scheduler_section_and_activate() {
        let yaml = r#"
scheduler:
  node_concurrency: 2
  line_timeout_seconds: 30
  long_running_logging_interval_seconds: 10
nodes:
  - name: classify
    tool: echo
    inputs:
      value: ${inputs.kind}
  - name: answer
    tool: echo
    inputs:
      value: fixed
    activate:
      when: ${classify.output}
      is: qa
"#;

        let cfg: FlowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.scheduler.node_concurrency, Some(2));
        assert_eq!(cfg.line_timeout(), Some(Duration::from_secs(30)));

        let nodes = cfg.nodes();
        let activate = nodes[1].activate.as_ref().unwrap();
        assert_eq!(activate.condition, InputAssignment::node_reference("classify"));
        assert_eq!(activate.condition_value, json!("qa"));
        assert_eq!(
            nodes[1].inputs.get("value"),
            Some(&InputAssignment::literal("fixed"))
        );
    }

    #[test]
    fn test_load_and_validate_valid_flow() {
        let file = write_flow(
            r#"
nodes:
  - name: a
    tool: echo
    inputs:
      value: ${inputs.text}
  - name: b
    tool: reverse_text
    inputs:
      text: ${a.output}
"#,
        );

        let result = load_and_validate_flow(file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_and_validate_cyclic_flow() {
        let file = write_flow(
            r#"
nodes:
  - name: a
    tool: echo
    inputs:
      value: ${b.output}
  - name: b
    tool: echo
    inputs:
      value: ${a.output}
"#,
        );

        let error_msg = load_and_validate_flow(file.path()).unwrap_err().to_string();
        assert!(error_msg.contains("Cyclic dependency detected"));
    }

    #[test]
    fn test_load_and_validate_unresolved_reference() {
        let file = write_flow(
            r#"
nodes:
  - name: a
    tool: echo
    inputs:
      value: ${nonexistent.output}
"#,
        );

        let error_msg = load_and_validate_flow(file.path()).unwrap_err().to_string();
        assert!(error_msg.contains("references 'nonexistent' which does not exist"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_flow("/definitely/not/here.yaml");
        assert!(matches!(result, Err(FlowConfigError::Io(_))));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let file = write_flow("nodes: [this is: not: valid");
        assert!(matches!(load_flow(file.path()), Err(FlowConfigError::Yaml(_))));
    }
}
