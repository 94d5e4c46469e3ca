// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with a `Display` implementation
//! so log text lives in one place instead of being scattered through the
//! scheduler. See [`messages`] for the catalogue and [`logging`] for
//! subscriber setup.
//!
//! # Usage
//!
//! ```rust
//! use flowline::observability::messages::{engine::NodeTaskFailed, StructuredLog};
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! NodeTaskFailed {
//!     node_name: "summarize",
//!     error: &error,
//!     outstanding: &[],
//! }
//! .log();
//! ```

pub mod logging;
pub mod messages;
