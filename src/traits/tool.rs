use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;

/// Keyword inputs handed to a tool, already resolved and filtered.
pub type ToolInputs = HashMap<String, Value>;

/// A single declared tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    /// Parameters with a default may be left unbound.
    pub has_default: bool,
}

/// What a tool accepts, used to filter a node's bindings before invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSignature {
    pub parameters: Vec<ToolParameter>,
    /// Accept bindings that don't match a declared parameter (a `**kwargs` tool).
    pub accepts_extra: bool,
}

impl ToolSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ToolParameter {
            name: name.into(),
            has_default: false,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ToolParameter {
            name: name.into(),
            has_default: true,
        });
        self
    }

    pub fn with_extra(mut self) -> Self {
        self.accepts_extra = true;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.accepts_extra || self.parameter(name).is_some()
    }
}

/// A blocking tool. Runs on a worker thread so it cannot stall async tools.
pub trait SyncTool: Send + Sync {
    fn name(&self) -> &str;

    fn signature(&self) -> &ToolSignature;

    fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError>;
}

/// A natively asynchronous tool, awaited directly on the scheduler's runtime.
#[async_trait]
pub trait AsyncTool: Send + Sync {
    fn name(&self) -> &str;

    fn signature(&self) -> &ToolSignature;

    async fn call(&self, inputs: ToolInputs) -> Result<Value, ToolError>;
}

/// A tool tagged with its calling convention, resolved once per node task.
#[derive(Clone)]
pub enum Tool {
    Sync(Arc<dyn SyncTool>),
    Async(Arc<dyn AsyncTool>),
}

impl Tool {
    pub fn sync(tool: impl SyncTool + 'static) -> Self {
        Tool::Sync(Arc::new(tool))
    }

    pub fn r#async(tool: impl AsyncTool + 'static) -> Self {
        Tool::Async(Arc::new(tool))
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::Sync(tool) => tool.name(),
            Tool::Async(tool) => tool.name(),
        }
    }

    pub fn signature(&self) -> &ToolSignature {
        match self {
            Tool::Sync(tool) => tool.signature(),
            Tool::Async(tool) => tool.signature(),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Tool::Async(_))
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name())
            .field("async", &self.is_async())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_lookup() {
        let sig = ToolSignature::new().required("text").optional("suffix");
        assert!(sig.accepts("text"));
        assert!(sig.accepts("suffix"));
        assert!(!sig.accepts("temperature"));
        assert!(sig.parameter("suffix").unwrap().has_default);
        assert!(ToolSignature::new().with_extra().accepts("anything"));
    }
}
