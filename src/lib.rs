// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // tool implementations
pub mod config;     // flow files, options, runtime
pub mod engine;     // DAG scheduler and monitors
pub mod errors;     // error handling
pub mod flow;       // nodes and input bindings
pub mod observability;
pub mod traits;     // tool and execution context abstractions
