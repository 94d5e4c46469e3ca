use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::flow::Node;
use crate::traits::tool::{AsyncTool, SyncTool, ToolInputs};

/// Wraps each tool invocation of one line with run-info bookkeeping.
///
/// The scheduler only relies on the returned values; whatever lineage an
/// implementation records on the side is its own business.
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    /// Index of the line being executed, used in error reports.
    fn line_number(&self) -> Option<usize>;

    /// Blocking invocation. Called from a worker thread, never the scheduler loop.
    fn invoke_tool(
        &self,
        node: &Node,
        tool: &dyn SyncTool,
        inputs: ToolInputs,
    ) -> Result<Value, ToolError>;

    async fn invoke_tool_async(
        &self,
        node: &Node,
        tool: &dyn AsyncTool,
        inputs: ToolInputs,
    ) -> Result<Value, ToolError>;

    /// Record a node that was skipped without invoking its tool.
    fn bypass_node(&self, node: &Node);
}
