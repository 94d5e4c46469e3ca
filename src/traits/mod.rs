pub mod context;
pub mod tool;

pub use context::ExecutionContext;
pub use tool::{AsyncTool, SyncTool, Tool, ToolInputs, ToolParameter, ToolSignature};
