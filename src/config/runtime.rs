// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{FlowConfig, SchedulerOptions, ToolRegistry};
use crate::engine::{AsyncNodesScheduler, FlowExecutionContext, LineResult};
use crate::errors::{ExecutionError, FlowConfigError};
use crate::flow::{FlowInputs, Node};
use crate::traits::ExecutionContext;

/// A loaded flow, ready to run lines.
///
/// Holds the immutable pieces shared by every line: the node list, the tool
/// registry and the scheduler. Each call to [`run_line`](Self::run_line)
/// gets its own DAG state, semaphore and monitors.
///
/// # Examples
///
/// ```
/// use flowline::config::{FlowConfig, FlowRuntime};
/// use flowline::flow::FlowInputs;
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let yaml = r#"
/// nodes:
///   - name: shout
///     tool: change_text_case
///     options: { mode: upper }
///     inputs:
///       text: ${inputs.text}
/// "#;
/// let config: FlowConfig = serde_yaml::from_str(yaml)?;
/// let runtime = FlowRuntime::from_config(&config)?;
///
/// let inputs = FlowInputs::from([("text".to_string(), json!("hello"))]);
/// let result = runtime.run_line(inputs, Some(0), CancellationToken::new()).await?;
/// assert_eq!(result.outputs["shout"], json!("HELLO"));
/// # Ok(())
/// # }
/// ```
pub struct FlowRuntime {
    nodes: Vec<Arc<Node>>,
    scheduler: AsyncNodesScheduler,
    line_timeout: Option<Duration>,
}

impl FlowRuntime {
    /// Build nodes, tools and scheduler options from a flow definition.
    pub fn from_config(cfg: &FlowConfig) -> Result<Self, FlowConfigError> {
        let tools = ToolRegistry::from_config(cfg)?;
        let options = SchedulerOptions::from_config(&cfg.scheduler);
        Ok(Self {
            nodes: cfg.nodes(),
            scheduler: AsyncNodesScheduler::new(Arc::new(tools), options),
            line_timeout: cfg.line_timeout(),
        })
    }

    pub fn new(
        nodes: Vec<Arc<Node>>,
        scheduler: AsyncNodesScheduler,
        line_timeout: Option<Duration>,
    ) -> Self {
        Self {
            nodes,
            scheduler,
            line_timeout,
        }
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn scheduler(&self) -> &AsyncNodesScheduler {
        &self.scheduler
    }

    /// Run one line with a fresh [`FlowExecutionContext`].
    pub async fn run_line(
        &self,
        inputs: FlowInputs,
        line_number: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<LineResult, ExecutionError> {
        let context = Arc::new(FlowExecutionContext::new(line_number));
        self.run_line_with_context(inputs, context, cancel).await
    }

    pub async fn run_line_with_context(
        &self,
        inputs: FlowInputs,
        context: Arc<dyn ExecutionContext>,
        cancel: CancellationToken,
    ) -> Result<LineResult, ExecutionError> {
        self.scheduler
            .execute_with_cancellation(&self.nodes, &inputs, context, self.line_timeout, cancel)
            .await
    }
}
