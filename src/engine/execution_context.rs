// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::errors::ToolError;
use crate::flow::Node;
use crate::observability::messages::tool::{
    NodeBypassRecorded, ToolInvocationCompleted, ToolInvocationFailed, ToolInvocationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{AsyncTool, ExecutionContext, SyncTool, ToolInputs};

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Running,
    Completed,
    Failed,
    Bypassed,
}

/// What happened to one node of a line.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRunInfo {
    pub node: String,
    pub status: NodeStatus,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub duration: Option<Duration>,
    pub output: Option<Value>,
    pub error: Option<String>,
}

impl NodeRunInfo {
    fn running(node: &str) -> Self {
        Self {
            node: node.to_string(),
            status: NodeStatus::Running,
            start_time: Some(SystemTime::now()),
            end_time: None,
            duration: None,
            output: None,
            error: None,
        }
    }

    fn bypassed(node: &str) -> Self {
        let now = SystemTime::now();
        Self {
            node: node.to_string(),
            status: NodeStatus::Bypassed,
            start_time: Some(now),
            end_time: Some(now),
            duration: Some(Duration::ZERO),
            output: None,
            error: None,
        }
    }
}

/// Default [`ExecutionContext`]: invokes tools and keeps a [`NodeRunInfo`] per node.
#[derive(Debug)]
pub struct FlowExecutionContext {
    line_number: Option<usize>,
    run_id: String,
    run_infos: Mutex<HashMap<String, NodeRunInfo>>,
}

impl FlowExecutionContext {
    pub fn new(line_number: Option<usize>) -> Self {
        let seq = NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed);
        let run_id = match line_number {
            Some(line) => format!("run-{}-line-{}", seq, line),
            None => format!("run-{}", seq),
        };
        Self::with_run_id(line_number, run_id)
    }

    pub fn with_run_id(line_number: Option<usize>, run_id: impl Into<String>) -> Self {
        Self {
            line_number,
            run_id: run_id.into(),
            run_infos: Mutex::new(HashMap::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_info(&self, node_name: &str) -> Option<NodeRunInfo> {
        self.infos().get(node_name).cloned()
    }

    /// Snapshot of every recorded node, sorted by node name.
    pub fn run_infos(&self) -> Vec<NodeRunInfo> {
        let mut infos: Vec<NodeRunInfo> = self.infos().values().cloned().collect();
        infos.sort_by(|a, b| a.node.cmp(&b.node));
        infos
    }

    fn infos(&self) -> MutexGuard<'_, HashMap<String, NodeRunInfo>> {
        self.run_infos.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start(&self, node: &Node) -> Instant {
        self.infos()
            .insert(node.name.clone(), NodeRunInfo::running(&node.name));
        Instant::now()
    }

    fn finish(&self, node: &Node, started: Instant, result: &Result<Value, ToolError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => ToolInvocationCompleted {
                node_name: &node.name,
                duration,
            }
            .log(),
            Err(err) => ToolInvocationFailed {
                node_name: &node.name,
                error: err.as_ref(),
            }
            .log(),
        }

        let mut infos = self.infos();
        let info = infos
            .entry(node.name.clone())
            .or_insert_with(|| NodeRunInfo::running(&node.name));
        info.end_time = Some(SystemTime::now());
        info.duration = Some(duration);
        match result {
            Ok(value) => {
                info.status = NodeStatus::Completed;
                info.output = Some(value.clone());
            }
            Err(err) => {
                info.status = NodeStatus::Failed;
                info.error = Some(err.to_string());
            }
        }
    }
}

#[async_trait]
impl ExecutionContext for FlowExecutionContext {
    fn line_number(&self) -> Option<usize> {
        self.line_number
    }

    fn invoke_tool(
        &self,
        node: &Node,
        tool: &dyn SyncTool,
        inputs: ToolInputs,
    ) -> Result<Value, ToolError> {
        let msg = ToolInvocationStarted {
            node_name: &node.name,
            tool_name: tool.name(),
            is_async: false,
        };
        let span = msg.span(&self.run_id);
        let _guard = span.enter();
        msg.log();

        let started = self.start(node);
        let result = tool.call(inputs);
        self.finish(node, started, &result);
        result
    }

    async fn invoke_tool_async(
        &self,
        node: &Node,
        tool: &dyn AsyncTool,
        inputs: ToolInputs,
    ) -> Result<Value, ToolError> {
        let msg = ToolInvocationStarted {
            node_name: &node.name,
            tool_name: tool.name(),
            is_async: true,
        };
        let span = msg.span(&self.run_id);
        span.in_scope(|| msg.log());

        let started = self.start(node);
        let result = tool.call(inputs).instrument(span).await;
        self.finish(node, started, &result);
        result
    }

    fn bypass_node(&self, node: &Node) {
        NodeBypassRecorded {
            node_name: &node.name,
        }
        .log();
        self.infos()
            .insert(node.name.clone(), NodeRunInfo::bypassed(&node.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingTool, FixedTool};
    use serde_json::json;

    #[tokio::test]
    async fn records_completed_and_failed_invocations() {
        let context = FlowExecutionContext::with_run_id(Some(4), "run");
        let ok = Node::new("ok", "fixed");
        let bad = Node::new("bad", "failing");

        let output = context
            .invoke_tool_async(&ok, &FixedTool::new(json!("x")), ToolInputs::new())
            .await
            .unwrap();
        assert_eq!(output, json!("x"));

        let err = context
            .invoke_tool(&bad, &FailingTool::new("quota exceeded"), ToolInputs::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");

        let ok_info = context.run_info("ok").unwrap();
        assert_eq!(ok_info.status, NodeStatus::Completed);
        assert_eq!(ok_info.output, Some(json!("x")));
        assert!(ok_info.duration.is_some());

        let bad_info = context.run_info("bad").unwrap();
        assert_eq!(bad_info.status, NodeStatus::Failed);
        assert_eq!(bad_info.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn bypassed_nodes_are_recorded_without_output() {
        let context = FlowExecutionContext::new(None);
        context.bypass_node(&Node::new("skipped", "echo"));

        let infos = context.run_infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].status, NodeStatus::Bypassed);
        assert!(infos[0].output.is_none());
        assert!(context.run_id().starts_with("run-"));
    }
}
