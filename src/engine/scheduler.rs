// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded-concurrency DAG execution for a single line.
//!
//! [`AsyncNodesScheduler`] drives one line's node graph to completion. Each
//! call to [`execute`](AsyncNodesScheduler::execute) builds its own run state
//! (DAG bookkeeping, concurrency gate, task map and monitors), so concurrent
//! lines never share anything mutable. The node list and the tool registry are
//! the only shared, read-only inputs.
//!
//! # Dispatch loop
//!
//! ```text
//!            +-----------------------------+
//!            | drain bypassable nodes      |<-----------------+
//!            | (fixed point)               |                  |
//!            +--------------+--------------+                  |
//!                           v                                 |
//!            +-----------------------------+                  |
//!            | spawn every ready node      |                  |
//!            |  async tool -> awaited      |                  |
//!            |  sync tool  -> worker pool  |                  |
//!            +--------------+--------------+                  |
//!                           v                                 |
//!            +-----------------------------+   completed?     |
//!            | wait for the FIRST finished |------ no --------+
//!            | task, drain any others      |
//!            +--------------+--------------+
//!                           | yes
//!                           v
//!                  outputs + bypassed set
//! ```
//!
//! Results are fed back as soon as a task finishes, so one slow node never
//! holds back independent branches that became ready in the meantime.
//!
//! # Concurrency
//!
//! Tasks are created for every ready node immediately, but a task must hold a
//! semaphore permit while its tool runs. Sync tools keep their permit for the
//! lifetime of the worker closure, which bounds the blocking pool usage of a
//! line to `node_concurrency` threads as well.
//!
//! # Failure, timeout and cancellation
//!
//! * The first tool failure (or panic) aborts the line. Outstanding tasks are
//!   aborted and given a short grace period before the error is returned.
//! * The per-line deadline covers the whole loop. When it passes, outstanding
//!   tasks are cancelled the same way and
//!   [`ExecutionError::LineExecutionTimeout`] is returned.
//! * When the caller's [`CancellationToken`] fires, tasks are cancelled, the
//!   [`CancellationMonitor`] is armed (blocking tools cannot be interrupted)
//!   and [`ExecutionError::Cancelled`] is returned.
//! * An iteration with nothing running and nothing ready while the DAG is
//!   incomplete means the graph is malformed:
//!   [`ExecutionError::NoNodeExecuted`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use flowline::backends::local::EchoTool;
//! use flowline::config::{SchedulerOptions, ToolRegistry};
//! use flowline::engine::{AsyncNodesScheduler, FlowExecutionContext};
//! use flowline::flow::{FlowInputs, InputAssignment, Node};
//! use flowline::traits::Tool;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tools = ToolRegistry::new()
//!     .with_tool("a", Tool::r#async(EchoTool::new()))
//!     .with_tool("b", Tool::r#async(EchoTool::new()));
//! let nodes = vec![
//!     Arc::new(Node::new("a", "echo").with_input("value", InputAssignment::literal("done"))),
//!     Arc::new(Node::new("b", "echo").with_input("value", InputAssignment::node_reference("a"))),
//! ];
//!
//! let scheduler = AsyncNodesScheduler::new(Arc::new(tools), SchedulerOptions::new(2));
//! let context = Arc::new(FlowExecutionContext::new(Some(0)));
//! let result = scheduler.execute(&nodes, &FlowInputs::new(), context, None).await?;
//!
//! assert_eq!(result.outputs["b"], json!("done"));
//! assert!(result.bypassed_nodes.is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{SchedulerOptions, ToolRegistry};
use crate::engine::dag_manager::DagManager;
use crate::engine::monitor::{
    CancellationMonitor, CompletionGuard, CompletionSignal, StallMonitor, TaskKey, TaskRegistry,
};
use crate::errors::ExecutionError;
use crate::flow::{FlowInputs, Node, NodeOutputs};
use crate::observability::messages::engine::{
    CancellationRequested, LineExecutionCompleted, LineExecutionStarted, LineExecutionTimedOut,
    NoProgressDetected, NodeTaskFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{AsyncTool, ExecutionContext, SyncTool, Tool, ToolInputs};

type TaskOutcome = Result<Value, ExecutionError>;
type Joined = Result<(task::Id, TaskOutcome), JoinError>;

/// Outputs of a successfully executed line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    /// Every node of the flow. Bypassed nodes map to `null`.
    pub outputs: NodeOutputs,
    pub bypassed_nodes: BTreeSet<String>,
}

/// Runs the node graph of one line at a time per call; share it freely across lines.
pub struct AsyncNodesScheduler {
    tools: Arc<ToolRegistry>,
    options: SchedulerOptions,
}

impl AsyncNodesScheduler {
    pub fn new(tools: Arc<ToolRegistry>, options: SchedulerOptions) -> Self {
        Self { tools, options }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Execute `nodes` against `inputs`, failing if the line takes longer than `timeout`.
    pub async fn execute(
        &self,
        nodes: &[Arc<Node>],
        inputs: &FlowInputs,
        context: Arc<dyn ExecutionContext>,
        timeout: Option<Duration>,
    ) -> Result<LineResult, ExecutionError> {
        self.execute_with_cancellation(nodes, inputs, context, timeout, CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), additionally stopping when `cancel` fires.
    pub async fn execute_with_cancellation(
        &self,
        nodes: &[Arc<Node>],
        inputs: &FlowInputs,
        context: Arc<dyn ExecutionContext>,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<LineResult, ExecutionError> {
        let started = LineExecutionStarted {
            line_number: context.line_number(),
            node_count: nodes.len(),
            node_concurrency: self.options.node_concurrency,
        };
        let span = started.span("execute");
        span.in_scope(|| started.log());

        LineRun::new(self, nodes, inputs.clone(), context)
            .execute(timeout, cancel)
            .instrument(span)
            .await
    }
}

struct RunningTask {
    node: Arc<Node>,
    key: TaskKey,
}

enum Wake {
    Cancelled,
    TimedOut,
    Joined(Option<Joined>),
}

/// State owned by a single `execute()` call.
struct LineRun {
    tools: Arc<ToolRegistry>,
    options: SchedulerOptions,
    context: Arc<dyn ExecutionContext>,
    line_number: Option<usize>,
    dag: DagManager,
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<TaskOutcome>,
    running: HashMap<task::Id, RunningTask>,
    registry: Arc<TaskRegistry>,
    completion: CompletionGuard,
}

impl LineRun {
    fn new(
        scheduler: &AsyncNodesScheduler,
        nodes: &[Arc<Node>],
        inputs: FlowInputs,
        context: Arc<dyn ExecutionContext>,
    ) -> Self {
        Self {
            tools: Arc::clone(&scheduler.tools),
            options: scheduler.options.clone(),
            line_number: context.line_number(),
            context,
            dag: DagManager::new(nodes, inputs),
            semaphore: Arc::new(Semaphore::new(scheduler.options.node_concurrency)),
            tasks: JoinSet::new(),
            running: HashMap::new(),
            registry: Arc::new(TaskRegistry::new()),
            completion: CompletionGuard(Arc::new(CompletionSignal::new())),
        }
    }

    async fn execute(
        mut self,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<LineResult, ExecutionError> {
        let started_at = Instant::now();
        self.start_stall_monitor();

        if let Err(err) = self.run_to_completion(timeout, &cancel).await {
            self.cancel_outstanding().await;
            if err.is_cancelled() {
                self.start_cancellation_monitor();
            }
            return Err(err);
        }

        // Stop the stall monitor before assembling the result.
        self.completion.0.set();

        let (mut outputs, bypassed_nodes) = self.dag.into_parts();
        let completed_count = outputs.len();
        for name in &bypassed_nodes {
            outputs.insert(name.clone(), Value::Null);
        }

        LineExecutionCompleted {
            line_number: self.line_number,
            completed_count,
            bypassed_count: bypassed_nodes.len(),
            duration: started_at.elapsed(),
        }
        .log();

        Ok(LineResult {
            outputs,
            bypassed_nodes,
        })
    }

    async fn run_to_completion(
        &mut self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);

        while !self.dag.completed() {
            self.bypass_nodes()?;
            self.dispatch_ready_nodes()?;

            if self.dag.completed() {
                break;
            }
            if self.tasks.is_empty() {
                let pending = self.dag.pending_names();
                NoProgressDetected {
                    line_number: self.line_number,
                    pending: &pending,
                    completed_count: self.dag.completed_nodes_outputs().len(),
                    bypassed_count: self.dag.bypassed_nodes().len(),
                }
                .log();
                return Err(ExecutionError::NoNodeExecuted { pending });
            }

            let wake = tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                joined = next_completion(&mut self.tasks, deadline) => match joined {
                    Some(joined) => Wake::Joined(joined),
                    None => Wake::TimedOut,
                },
            };

            match wake {
                Wake::Joined(Some(first)) => self.complete_finished(first)?,
                Wake::Joined(None) => {}
                Wake::TimedOut => {
                    let timeout = timeout.unwrap_or_default();
                    LineExecutionTimedOut {
                        line_number: self.line_number,
                        timeout,
                        outstanding: &self.outstanding(),
                    }
                    .log();
                    return Err(ExecutionError::LineExecutionTimeout {
                        line_number: self.line_number,
                        timeout,
                    });
                }
                Wake::Cancelled => {
                    CancellationRequested {
                        line_number: self.line_number,
                        outstanding: &self.outstanding(),
                    }
                    .log();
                    return Err(ExecutionError::Cancelled {
                        line_number: self.line_number,
                    });
                }
            }
        }

        Ok(())
    }

    /// Skip nodes until no more can be skipped, recording each in the context.
    fn bypass_nodes(&mut self) -> Result<(), ExecutionError> {
        loop {
            let bypassed = self.dag.pop_bypassable_nodes()?;
            if bypassed.is_empty() {
                return Ok(());
            }
            for node in &bypassed {
                self.context.bypass_node(node);
            }
        }
    }

    fn dispatch_ready_nodes(&mut self) -> Result<(), ExecutionError> {
        for node in self.dag.pop_ready_nodes() {
            let tool = self.tools.get_tool(&node)?;
            let inputs = self
                .dag
                .get_node_valid_inputs(&node, tool.signature(), tool.name())?;
            self.spawn_node(node, tool, inputs);
        }
        Ok(())
    }

    fn spawn_node(&mut self, node: Arc<Node>, tool: Tool, inputs: ToolInputs) {
        let key = self.registry.register(&node.name);
        let semaphore = Arc::clone(&self.semaphore);
        let context = Arc::clone(&self.context);
        let task_node = Arc::clone(&node);

        let handle = match tool {
            Tool::Async(tool) => self
                .tasks
                .spawn(run_async_tool(semaphore, context, task_node, tool, inputs).in_current_span()),
            Tool::Sync(tool) => {
                let registry = Arc::clone(&self.registry);
                self.tasks.spawn(
                    run_sync_tool(semaphore, registry, key, context, task_node, tool, inputs)
                        .in_current_span(),
                )
            }
        };
        self.running.insert(handle.id(), RunningTask { node, key });
    }

    /// Record `first` and every other task that has already finished as one batch.
    fn complete_finished(&mut self, first: Joined) -> Result<(), ExecutionError> {
        let mut batch = NodeOutputs::new();
        let mut next = Some(first);
        while let Some(joined) = next {
            let (node, value) = self.take_result(joined)?;
            batch.insert(node.name.clone(), value);
            next = self.tasks.try_join_next_with_id();
        }
        self.dag.complete_nodes(batch);
        Ok(())
    }

    fn take_result(&mut self, joined: Joined) -> Result<(Arc<Node>, Value), ExecutionError> {
        let id = match &joined {
            Ok((id, _)) => *id,
            Err(err) => err.id(),
        };
        let task = self
            .running
            .remove(&id)
            .ok_or_else(|| ExecutionError::InternalError {
                message: format!("Finished task {} is not tracked by the scheduler", id),
            })?;
        self.registry.finish(task.key);

        let outcome = match joined {
            Ok((_, outcome)) => outcome,
            Err(err) if err.is_panic() => Err(ExecutionError::ToolPanicked {
                node_name: task.node.name.clone(),
            }),
            Err(_) => Err(ExecutionError::InternalError {
                message: format!("Task for node '{}' was cancelled unexpectedly", task.node.name),
            }),
        };

        match outcome {
            Ok(value) => Ok((task.node, value)),
            Err(err) => {
                let outstanding = self.outstanding();
                let failed = NodeTaskFailed {
                    node_name: &task.node.name,
                    error: &err,
                    outstanding: &outstanding,
                };
                failed.span("node_failure").in_scope(|| failed.log());
                Err(err)
            }
        }
    }

    fn outstanding(&self) -> Vec<String> {
        let mut names: Vec<String> = self.running.values().map(|t| t.node.name.clone()).collect();
        names.sort();
        names
    }

    /// Abort every in-flight task and wait a bounded time for them to unwind.
    async fn cancel_outstanding(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.tasks.abort_all();

        let grace = self.options.cancel_grace_period;
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next_with_id().await {
                let id = match &joined {
                    Ok((id, _)) => *id,
                    Err(err) => err.id(),
                };
                if let Some(task) = self.running.remove(&id) {
                    self.registry.finish(task.key);
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                line_number = ?self.line_number,
                outstanding = ?self.outstanding(),
                "Tasks did not finish within {:?} after being cancelled",
                grace
            );
        }
    }

    fn start_stall_monitor(&self) {
        let Some(interval) = self.options.long_running_logging_interval else {
            return;
        };
        if let Err(err) = StallMonitor::spawn(
            Arc::clone(&self.registry),
            Arc::clone(&self.completion.0),
            interval,
            self.options.monitor_poll_interval,
        ) {
            tracing::warn!(error = %err, "Failed to start the long running task monitor");
        }
    }

    fn start_cancellation_monitor(&self) {
        if !self.options.cancellation.force_exit {
            return;
        }
        if let Err(err) = CancellationMonitor::spawn(
            Arc::clone(&self.registry),
            self.options.cancellation.clone(),
            self.options.monitor_poll_interval,
        ) {
            tracing::error!(error = %err, "Failed to start the cancellation monitor");
        }
    }
}

/// `None` when the deadline passes first.
async fn next_completion(
    tasks: &mut JoinSet<TaskOutcome>,
    deadline: Option<tokio::time::Instant>,
) -> Option<Option<Joined>> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, tasks.join_next_with_id())
            .await
            .ok(),
        None => Some(tasks.join_next_with_id().await),
    }
}

async fn acquire(semaphore: Arc<Semaphore>) -> Result<OwnedSemaphorePermit, ExecutionError> {
    semaphore
        .acquire_owned()
        .await
        .map_err(|_| ExecutionError::InternalError {
            message: "The node concurrency gate was closed".to_string(),
        })
}

async fn run_async_tool(
    semaphore: Arc<Semaphore>,
    context: Arc<dyn ExecutionContext>,
    node: Arc<Node>,
    tool: Arc<dyn AsyncTool>,
    inputs: ToolInputs,
) -> TaskOutcome {
    let _permit = acquire(semaphore).await?;
    context
        .invoke_tool_async(&node, tool.as_ref(), inputs)
        .await
        .map_err(|source| ExecutionError::ToolExecutionFailed {
            node_name: node.name.clone(),
            source,
        })
}

async fn run_sync_tool(
    semaphore: Arc<Semaphore>,
    registry: Arc<TaskRegistry>,
    key: TaskKey,
    context: Arc<dyn ExecutionContext>,
    node: Arc<Node>,
    tool: Arc<dyn SyncTool>,
    inputs: ToolInputs,
) -> TaskOutcome {
    let permit = acquire(semaphore).await?;
    let guard = registry.enter_blocking(key);
    let worker_node = Arc::clone(&node);

    // The permit travels with the closure: an aborted wrapper must not free
    // a slot while its thread is still busy.
    let worker = task::spawn_blocking(move || {
        let _permit = permit;
        let _guard = guard;
        context.invoke_tool(&worker_node, tool.as_ref(), inputs)
    });

    match worker.await {
        Ok(result) => result.map_err(|source| ExecutionError::ToolExecutionFailed {
            node_name: node.name.clone(),
            source,
        }),
        Err(err) if err.is_panic() => Err(ExecutionError::ToolPanicked {
            node_name: node.name.clone(),
        }),
        Err(_) => Err(ExecutionError::InternalError {
            message: format!("Blocking worker for node '{}' was cancelled", node.name),
        }),
    }
}
