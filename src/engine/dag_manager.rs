// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Readiness and bypass bookkeeping for a single line.
//!
//! A [`DagManager`] is owned by one scheduler invocation and mutated only from
//! its dispatch loop. Every node is in exactly one state at a time: pending,
//! running (popped as ready, not yet completed), completed or bypassed.
//!
//! A node is *ready* once every node it references, through its inputs or its
//! activate condition, is completed or bypassed. A ready node is *bypassable*
//! when:
//!
//! 1. its activate condition references a bypassed node, or
//! 2. its activate condition resolves to something other than the expected value, or
//! 3. it has no activate condition, references at least one node, and all of
//!    the referenced nodes are bypassed.
//!
//! Bypassing one node can make its dependents bypassable, so callers drain
//! [`DagManager::pop_bypassable_nodes`] until it returns nothing.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::InputError;
use crate::flow::{FlowInputs, InputAssignment, Node, NodeOutputs};
use crate::observability::messages::dag::{
    BypassReason, BypassedInputDefaulted, InputDropped, NodeActivated, NodeBypassed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ToolInputs, ToolSignature};

#[derive(Debug)]
pub struct DagManager {
    nodes: Vec<Arc<Node>>,
    flow_inputs: FlowInputs,
    /// Not yet started, in declaration order.
    pending: Vec<Arc<Node>>,
    completed_nodes_outputs: NodeOutputs,
    bypassed_nodes: BTreeSet<String>,
}

impl DagManager {
    pub fn new(nodes: &[Arc<Node>], flow_inputs: FlowInputs) -> Self {
        Self {
            nodes: nodes.to_vec(),
            flow_inputs,
            pending: nodes.to_vec(),
            completed_nodes_outputs: NodeOutputs::new(),
            bypassed_nodes: BTreeSet::new(),
        }
    }

    pub fn completed_nodes_outputs(&self) -> &NodeOutputs {
        &self.completed_nodes_outputs
    }

    pub fn bypassed_nodes(&self) -> &BTreeSet<String> {
        &self.bypassed_nodes
    }

    /// Consume the manager, yielding completed outputs and the bypassed set.
    pub fn into_parts(self) -> (NodeOutputs, BTreeSet<String>) {
        (self.completed_nodes_outputs, self.bypassed_nodes)
    }

    pub fn pending_names(&self) -> Vec<String> {
        self.pending.iter().map(|n| n.name.clone()).collect()
    }

    /// Remove and return every ready node that should run.
    ///
    /// Nodes whose activation can already be decided as false stay pending
    /// for [`pop_bypassable_nodes`](Self::pop_bypassable_nodes).
    pub fn pop_ready_nodes(&mut self) -> Vec<Arc<Node>> {
        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|node| {
                self.is_node_ready(node) && !matches!(self.bypass_decision(node), Ok(Some(_)))
            });
        self.pending = pending;
        ready
    }

    /// Remove and return every ready node that should be skipped, recording
    /// them as bypassed. Fails if an activate condition cannot be resolved.
    pub fn pop_bypassable_nodes(&mut self) -> Result<Vec<Arc<Node>>, InputError> {
        let mut bypassed = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());

        let mut pending = std::mem::take(&mut self.pending).into_iter();
        while let Some(node) = pending.next() {
            if !self.is_node_ready(&node) {
                remaining.push(node);
                continue;
            }
            match self.bypass_decision(&node) {
                Ok(Some(decision)) => {
                    decision.log(&node);
                    // Visible to the nodes checked later in this same pass.
                    self.bypassed_nodes.insert(node.name.clone());
                    bypassed.push(node);
                }
                Ok(None) => {
                    if let Some(activate) = &node.activate {
                        NodeActivated {
                            node_name: &node.name,
                            condition: &render(&activate.condition),
                            expected: &activate.condition_value,
                        }
                        .log();
                    }
                    remaining.push(node);
                }
                Err(err) => {
                    remaining.push(node);
                    remaining.extend(pending);
                    self.pending = remaining;
                    return Err(err);
                }
            }
        }

        self.pending = remaining;
        Ok(bypassed)
    }

    /// Record the outputs of a batch of finished nodes.
    pub fn complete_nodes(&mut self, nodes_outputs: NodeOutputs) {
        self.completed_nodes_outputs.extend(nodes_outputs);
    }

    pub fn completed(&self) -> bool {
        self.nodes.iter().all(|node| {
            self.completed_nodes_outputs.contains_key(&node.name)
                || self.bypassed_nodes.contains(&node.name)
        })
    }

    /// Resolve a ready node's bindings into the keyword inputs its tool accepts.
    ///
    /// Undeclared bindings are dropped. A binding to a bypassed node is left
    /// out when the parameter has a default and passed as `null` otherwise.
    pub fn get_node_valid_inputs(
        &self,
        node: &Node,
        signature: &ToolSignature,
        tool_name: &str,
    ) -> Result<ToolInputs, InputError> {
        let mut results = ToolInputs::new();

        for (name, assignment) in &node.inputs {
            if !signature.accepts(name) {
                InputDropped {
                    node_name: &node.name,
                    input: name,
                    tool_name,
                }
                .log();
                continue;
            }

            if let Some(referenced) = self.bypassed_dependency(assignment) {
                if signature.parameter(name).is_some_and(|p| p.has_default) {
                    continue;
                }
                BypassedInputDefaulted {
                    node_name: &node.name,
                    input: name,
                    referenced_node: referenced,
                }
                .log();
                results.insert(name.clone(), Value::Null);
            } else {
                let value = assignment.resolve(&self.completed_nodes_outputs, &self.flow_inputs)?;
                results.insert(name.clone(), value);
            }
        }

        if let Some(missing) = signature
            .parameters
            .iter()
            .find(|p| !p.has_default && !results.contains_key(&p.name))
        {
            return Err(InputError::MissingRequiredInput {
                node_name: node.name.clone(),
                parameter: missing.name.clone(),
            });
        }

        Ok(results)
    }

    fn is_node_ready(&self, node: &Node) -> bool {
        node.dependencies().all(|dependency| {
            self.completed_nodes_outputs.contains_key(dependency)
                || self.bypassed_nodes.contains(dependency)
        })
    }

    fn bypassed_dependency<'a>(&self, assignment: &'a InputAssignment) -> Option<&'a str> {
        assignment
            .referenced_node()
            .filter(|node| self.bypassed_nodes.contains(*node))
    }

    /// `Some` if a ready node should be bypassed. Does not log.
    fn bypass_decision(&self, node: &Node) -> Result<Option<BypassDecision>, InputError> {
        if let Some(activate) = &node.activate {
            // The activate condition, when present, is the only rule applied.
            if let Some(source) = self.bypassed_dependency(&activate.condition) {
                return Ok(Some(BypassDecision::ConditionSourceBypassed(source.to_string())));
            }
            let actual = activate
                .condition
                .resolve(&self.completed_nodes_outputs, &self.flow_inputs)?;
            if actual != activate.condition_value {
                return Ok(Some(BypassDecision::ConditionNotMet));
            }
            return Ok(None);
        }

        let dependencies: Vec<&str> = node.input_dependencies().collect();
        let all_bypassed = !dependencies.is_empty()
            && dependencies.iter().all(|d| self.bypassed_nodes.contains(*d));
        if all_bypassed {
            Ok(Some(BypassDecision::AllDependenciesBypassed))
        } else {
            Ok(None)
        }
    }
}

enum BypassDecision {
    ConditionSourceBypassed(String),
    ConditionNotMet,
    AllDependenciesBypassed,
}

impl BypassDecision {
    fn log(&self, node: &Node) {
        let condition = node.activate.as_ref().map(|a| render(&a.condition)).unwrap_or_default();
        let dependencies: Vec<&str> = node.input_dependencies().collect();
        let reason = match self {
            BypassDecision::ConditionSourceBypassed(source) => {
                BypassReason::ConditionSourceBypassed { source: source.as_str() }
            }
            BypassDecision::ConditionNotMet => match &node.activate {
                Some(activate) => BypassReason::ConditionNotMet {
                    condition: &condition,
                    expected: &activate.condition_value,
                },
                None => return,
            },
            BypassDecision::AllDependenciesBypassed => BypassReason::AllDependenciesBypassed {
                dependencies: &dependencies,
            },
        };
        NodeBypassed {
            node_name: &node.name,
            reason,
        }
        .log();
    }
}

fn render(assignment: &InputAssignment) -> String {
    match assignment.serialize() {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_signature() -> ToolSignature {
        ToolSignature::new().optional("value").with_extra()
    }

    fn drain_bypassable(dag: &mut DagManager) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            let batch = dag.pop_bypassable_nodes().unwrap();
            if batch.is_empty() {
                return names;
            }
            names.extend(batch.iter().map(|n| n.name.clone()));
        }
    }

    fn names(nodes: &[Arc<Node>]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn independent_nodes_are_ready_immediately() {
        let nodes = vec![
            Arc::new(Node::new("a", "echo")),
            Arc::new(Node::new("b", "echo").with_input("value", InputAssignment::literal(1))),
        ];
        let mut dag = DagManager::new(&nodes, FlowInputs::new());

        assert!(drain_bypassable(&mut dag).is_empty());
        assert_eq!(names(&dag.pop_ready_nodes()), vec!["a", "b"]);
        assert!(dag.pop_ready_nodes().is_empty());
        assert!(!dag.completed());
    }

    #[test]
    fn every_node_visited_once_and_after_its_dependencies() {
        // a -> b -> d, a -> c -> d, c gated off by a's output.
        let nodes = vec![
            Arc::new(Node::new("a", "echo")),
            Arc::new(Node::new("b", "echo").with_input("value", InputAssignment::node_reference("a"))),
            Arc::new(
                Node::new("c", "echo")
                    .with_input("value", InputAssignment::node_reference("a"))
                    .with_activate(InputAssignment::node_reference("a"), json!("go")),
            ),
            Arc::new(
                Node::new("d", "echo")
                    .with_input("left", InputAssignment::node_reference("b"))
                    .with_input("right", InputAssignment::node_reference("c")),
            ),
        ];
        let mut dag = DagManager::new(&nodes, FlowInputs::new());
        let mut visited: Vec<String> = Vec::new();

        while !dag.completed() {
            visited.extend(drain_bypassable(&mut dag));
            let ready = dag.pop_ready_nodes();
            for node in &ready {
                for dep in node.dependencies() {
                    assert!(
                        dag.completed_nodes_outputs().contains_key(dep)
                            || dag.bypassed_nodes().contains(dep),
                        "{} popped before {}",
                        node.name,
                        dep
                    );
                }
            }
            visited.extend(ready.iter().map(|n| n.name.clone()));
            dag.complete_nodes(
                ready
                    .iter()
                    .map(|n| (n.name.clone(), json!(format!("{}-out", n.name))))
                    .collect(),
            );
        }

        visited.sort();
        assert_eq!(visited, vec!["a", "b", "c", "d"]);
        assert_eq!(dag.bypassed_nodes().iter().collect::<Vec<_>>(), vec!["c"]);
        assert!(dag.pending_names().is_empty());
    }

    #[test]
    fn bypass_propagates_transitively_without_ready_pop() {
        let nodes = vec![
            Arc::new(Node::new("gate", "echo").with_activate(InputAssignment::flow_input("enabled"), json!(true))),
            Arc::new(Node::new("after", "echo").with_input("value", InputAssignment::node_reference("gate"))),
            Arc::new(Node::new("last", "echo").with_input("value", InputAssignment::node_reference("after"))),
        ];
        let inputs = FlowInputs::from([("enabled".to_string(), json!(false))]);
        let mut dag = DagManager::new(&nodes, inputs);

        let mut bypassed = drain_bypassable(&mut dag);
        bypassed.sort();
        assert_eq!(bypassed, vec!["after", "gate", "last"]);
        assert!(dag.completed());
    }

    #[test]
    fn pop_ready_skips_nodes_whose_condition_is_false() {
        let nodes = vec![Arc::new(
            Node::new("gate", "echo").with_activate(InputAssignment::flow_input("mode"), json!("on")),
        )];
        let inputs = FlowInputs::from([("mode".to_string(), json!("off"))]);
        let mut dag = DagManager::new(&nodes, inputs);

        assert!(dag.pop_ready_nodes().is_empty());
        assert_eq!(names(&dag.pop_bypassable_nodes().unwrap()), vec!["gate"]);
    }

    #[test]
    fn partially_bypassed_inputs_still_run() {
        let nodes = vec![
            Arc::new(Node::new("off", "echo").with_activate(InputAssignment::literal(1), json!(2))),
            Arc::new(Node::new("on", "echo")),
            Arc::new(
                Node::new("join", "echo")
                    .with_input("left", InputAssignment::node_reference("off"))
                    .with_input("right", InputAssignment::node_reference("on")),
            ),
        ];
        let mut dag = DagManager::new(&nodes, FlowInputs::new());

        assert_eq!(drain_bypassable(&mut dag), vec!["off"]);
        assert_eq!(names(&dag.pop_ready_nodes()), vec!["on"]);
        dag.complete_nodes(NodeOutputs::from([("on".to_string(), json!("x"))]));

        assert!(drain_bypassable(&mut dag).is_empty());
        assert_eq!(names(&dag.pop_ready_nodes()), vec!["join"]);
    }

    #[test]
    fn unresolvable_condition_is_an_error() {
        let nodes = vec![Arc::new(
            Node::new("gate", "echo").with_activate(InputAssignment::flow_input("missing"), json!(true)),
        )];
        let mut dag = DagManager::new(&nodes, FlowInputs::new());

        assert_eq!(
            dag.pop_bypassable_nodes(),
            Err(InputError::FlowInputNotFound {
                input: "missing".to_string()
            })
        );
        assert_eq!(dag.pending_names(), vec!["gate"]);
    }

    #[test]
    fn valid_inputs_are_filtered_to_signature() {
        let node = Node::new("fmt", "prefix_suffix_adder")
            .with_input("text", InputAssignment::flow_input("q"))
            .with_input("temperature", InputAssignment::literal(0.2));
        let dag = DagManager::new(
            &[Arc::new(node.clone())],
            FlowInputs::from([("q".to_string(), json!("hi"))]),
        );
        let signature = ToolSignature::new().required("text").optional("suffix");

        let inputs = dag.get_node_valid_inputs(&node, &signature, "prefix_suffix_adder").unwrap();
        assert_eq!(inputs, ToolInputs::from([("text".to_string(), json!("hi"))]));
    }

    #[test]
    fn bypassed_bindings_use_default_or_null() {
        let nodes = vec![
            Arc::new(Node::new("off", "echo").with_activate(InputAssignment::literal(false), json!(true))),
            Arc::new(Node::new("on", "echo")),
        ];
        let mut dag = DagManager::new(&nodes, FlowInputs::new());
        drain_bypassable(&mut dag);
        dag.complete_nodes(NodeOutputs::from([("on".to_string(), json!("x"))]));

        let consumer = Node::new("consumer", "tool")
            .with_input("required", InputAssignment::node_reference("off"))
            .with_input("defaulted", InputAssignment::node_reference("off"))
            .with_input("live", InputAssignment::node_reference("on"));
        let signature = ToolSignature::new()
            .required("required")
            .optional("defaulted")
            .required("live");

        let inputs = dag.get_node_valid_inputs(&consumer, &signature, "tool").unwrap();
        assert_eq!(
            inputs,
            ToolInputs::from([
                ("required".to_string(), Value::Null),
                ("live".to_string(), json!("x")),
            ])
        );
    }

    #[test]
    fn missing_required_parameter_fails() {
        let node = Node::new("fmt", "reverse_text");
        let dag = DagManager::new(&[Arc::new(node.clone())], FlowInputs::new());
        let signature = ToolSignature::new().required("text");

        assert_eq!(
            dag.get_node_valid_inputs(&node, &signature, "reverse_text"),
            Err(InputError::MissingRequiredInput {
                node_name: "fmt".to_string(),
                parameter: "text".to_string(),
            })
        );
        // Extra-accepting tools still need their declared parameters.
        assert!(dag
            .get_node_valid_inputs(&node, &echo_signature(), "echo")
            .unwrap()
            .is_empty());
    }
}
