// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod options;
mod runtime;
mod tool_registry;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_flow, load_flow, ActivateConfig, FlowConfig, NodeConfig, SchedulerConfig,
};
pub use options::{CancellationOptions, ExitHook, SchedulerOptions};
pub use runtime::FlowRuntime;
pub use tool_registry::ToolRegistry;
pub use validation::validate_flow_graph;
