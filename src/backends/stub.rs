// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Instrumented tools for scheduler tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{AsyncTool, SyncTool, ToolInputs, ToolSignature};

/// Returns a fixed value, accepting any inputs.
pub struct FixedTool {
    value: Value,
    signature: ToolSignature,
}

impl FixedTool {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            signature: ToolSignature::new().with_extra(),
        }
    }
}

#[async_trait]
impl AsyncTool for FixedTool {
    fn name(&self) -> &str {
        "fixed"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        Ok(self.value.clone())
    }
}

/// A blocking tool that always fails
pub struct FailingTool {
    message: String,
    signature: ToolSignature,
}

impl FailingTool {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            signature: ToolSignature::new().with_extra(),
        }
    }
}

impl SyncTool for FailingTool {
    fn name(&self) -> &str {
        "failing"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        Err(self.message.clone().into())
    }
}

/// A blocking tool that panics
pub struct PanickingTool {
    signature: ToolSignature,
}

impl PanickingTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new().with_extra(),
        }
    }
}

impl SyncTool for PanickingTool {
    fn name(&self) -> &str {
        "panicking"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        panic!("tool blew up")
    }
}

/// Never completes. Flags `dropped` once its invocation is torn down.
pub struct PendingTool {
    pub dropped: Arc<AtomicBool>,
    signature: ToolSignature,
}

impl PendingTool {
    pub fn new() -> Self {
        Self {
            dropped: Arc::new(AtomicBool::new(false)),
            signature: ToolSignature::new().with_extra(),
        }
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AsyncTool for PendingTool {
    fn name(&self) -> &str {
        "pending"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        let _flag = DropFlag(Arc::clone(&self.dropped));
        std::future::pending::<()>().await;
        Ok(Value::Null)
    }
}

/// Shared instrumentation for timed test tools.
#[derive(Debug, Default)]
pub struct ProbeState {
    active: AtomicUsize,
    max_active: AtomicUsize,
    finished: Mutex<Vec<String>>,
    spans: Mutex<Vec<(String, Instant, Instant)>>,
}

impl ProbeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Labels in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// `(label, start, end)` of each finished invocation.
    pub fn spans(&self) -> Vec<(String, Instant, Instant)> {
        self.spans.lock().unwrap().clone()
    }

    fn enter(&self) -> Instant {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        Instant::now()
    }

    fn exit(&self, label: &str, started: Instant) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.spans
            .lock()
            .unwrap()
            .push((label.to_string(), started, Instant::now()));
        self.finished.lock().unwrap().push(label.to_string());
    }
}

/// Async tool sleeping for `delay`, recording into a [`ProbeState`]. Returns its label.
pub struct ProbeTool {
    label: String,
    delay: Duration,
    state: Arc<ProbeState>,
    signature: ToolSignature,
}

impl ProbeTool {
    pub fn new(label: impl Into<String>, delay: Duration, state: Arc<ProbeState>) -> Self {
        Self {
            label: label.into(),
            delay,
            state,
            signature: ToolSignature::new().with_extra(),
        }
    }
}

#[async_trait]
impl AsyncTool for ProbeTool {
    fn name(&self) -> &str {
        "probe"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        let started = self.state.enter();
        tokio::time::sleep(self.delay).await;
        self.state.exit(&self.label, started);
        Ok(Value::String(self.label.clone()))
    }
}

/// Blocking counterpart of [`ProbeTool`]: holds its thread with `std::thread::sleep`.
pub struct BlockingSleepTool {
    label: String,
    delay: Duration,
    state: Arc<ProbeState>,
    signature: ToolSignature,
}

impl BlockingSleepTool {
    pub fn new(label: impl Into<String>, delay: Duration, state: Arc<ProbeState>) -> Self {
        Self {
            label: label.into(),
            delay,
            state,
            signature: ToolSignature::new().with_extra(),
        }
    }
}

impl SyncTool for BlockingSleepTool {
    fn name(&self) -> &str {
        "blocking_sleep"
    }

    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    fn call(&self, _inputs: ToolInputs) -> Result<Value, ToolError> {
        let started = self.state.enter();
        std::thread::sleep(self.delay);
        self.state.exit(&self.label, started);
        Ok(Value::String(self.label.clone()))
    }
}
