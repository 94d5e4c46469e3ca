// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod dag_manager;
pub mod execution_context;
pub mod monitor;
pub mod scheduler;

pub use dag_manager::DagManager;
pub use execution_context::{FlowExecutionContext, NodeRunInfo, NodeStatus};
pub use scheduler::{AsyncNodesScheduler, LineResult};
