// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Flow graph validation.
//!
//! Checks run in order:
//!
//! 1. **Uniqueness**: node names are unique
//! 2. **References**: every node reference (inputs and activate conditions) names a declared node
//! 3. **Cycles**: DFS with a recursion stack, reporting the cycle path
//!
//! Cycle detection needs a structurally valid graph, so it only runs once the
//! first two checks pass. The scheduler still guards against malformed graphs
//! at runtime with `NoNodeExecuted`, but validating up front gives far better
//! error messages.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::ValidationError;
use crate::flow::Node;

/// Validate a node list, accumulating every error found.
pub fn validate_flow_graph(nodes: &[Arc<Node>]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_names(nodes) {
        errors.extend(duplicate_errors);
    }

    if let Err(unresolved_errors) = validate_node_references(nodes) {
        errors.extend(unresolved_errors);
    }

    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(nodes) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_names(nodes: &[Arc<Node>]) -> Result<(), Vec<ValidationError>> {
    let mut seen = HashSet::new();
    let errors: Vec<ValidationError> = nodes
        .iter()
        .filter(|node| !seen.insert(node.name.as_str()))
        .map(|node| ValidationError::DuplicateNodeName {
            node_name: node.name.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_node_references(nodes: &[Arc<Node>]) -> Result<(), Vec<ValidationError>> {
    let names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    let mut errors = Vec::new();

    for node in nodes {
        let mut reported = HashSet::new();
        for dependency in node.dependencies() {
            if !names.contains(dependency) && reported.insert(dependency) {
                errors.push(ValidationError::UnresolvedReference {
                    node_name: node.name.clone(),
                    missing_node: dependency.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_acyclic_graph(nodes: &[Arc<Node>]) -> Result<(), Vec<ValidationError>> {
    // dependency -> dependents
    let mut graph: HashMap<&str, Vec<&str>> = nodes
        .iter()
        .map(|n| (n.name.as_str(), Vec::new()))
        .collect();

    for node in nodes {
        for dependency in node.dependencies() {
            if let Some(dependents) = graph.get_mut(dependency) {
                dependents.push(node.name.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    // Walk in declaration order so the reported cycle is stable.
    for node in nodes {
        if !visited.contains(node.name.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(&node.name, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Err(vec![ValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|&x| x == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[cycle_start..].iter().map(|s| s.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
