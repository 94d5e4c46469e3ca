// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Subscriber setup using `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `FLOWLINE_LOG` (e.g. "info", "flowline::engine=debug")
//! 2. `RUST_LOG`
//! 3. the `default_directive` passed by the caller

use tracing_subscriber::EnvFilter;

use crate::config::consts::LOG_FILTER_ENV;

/// Install the global fmt subscriber. Returns an error if one is already set.
pub fn init_logging(default_directive: &str) -> anyhow::Result<()> {
    let filter = std::env::var(LOG_FILTER_ENV)
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
