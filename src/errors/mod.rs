// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod input;

pub use config::{FlowConfigError, ValidationError};
pub use execution::{ExecutionError, ToolError};
pub use input::InputError;
