// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tool implementations for flowline nodes.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust tools, created from a node's `tool:` name by
//! [`LocalToolFactory`](local::LocalToolFactory):
//! - **Text Transformation**: case conversion, reversal, prefix/suffix addition
//! - **Text Analysis**: token counting
//! - **Plumbing**: `echo` and `delay`, handy for wiring and timing flows
//!
//! Text tools are blocking ([`SyncTool`](crate::traits::SyncTool)) and run on
//! the scheduler's worker threads; `echo` and `delay` are natively async.
//!
//! ## Stub Backend (Test-Only)
//! Instrumented tools for scheduler tests (only available in test builds):
//! - **FixedTool**: returns a fixed value
//! - **FailingTool**: always fails
//! - **PendingTool**: never completes, reports when it is dropped
//! - **BlockingSleepTool** / **ProbeTool**: timed work recording concurrency and completion order
//!
//! # Example
//! ```rust
//! use flowline::backends::local::LocalToolFactory;
//! use flowline::config::NodeConfig;
//! use serde_json::json;
//! use std::collections::{BTreeMap, HashMap};
//!
//! let config = NodeConfig {
//!     name: "shout".to_string(),
//!     tool: "change_text_case".to_string(),
//!     inputs: BTreeMap::new(),
//!     options: HashMap::from([("mode".to_string(), json!("upper"))]),
//!     activate: None,
//! };
//!
//! let tool = LocalToolFactory::create_tool(&config)?;
//! assert!(!tool.is_async());
//! # Ok::<(), flowline::errors::FlowConfigError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
