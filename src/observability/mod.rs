// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability for structured logging.
//!
//! Diagnostic and operational events are emitted through message types in
//! [`messages`], organized by subsystem:
//! * `messages::graph` - topology compilation
//! * `messages::engine` - run lifecycle, sources, sinks and pipes
//! * `messages::config` - topology file loading
//!
//! Each message is a struct with a `Display` implementation, so log text
//! lives in one place instead of being scattered through the code.
//!
//! # Usage
//!
//! ```rust
//! use dagstream::observability::messages::engine::UnknownCollaborator;
//! use dagstream::observability::messages::StructuredLog;
//!
//! let msg = UnknownCollaborator {
//!     role: "source",
//!     kind: "kafka",
//!     path: "ingest",
//! };
//!
//! msg.log();
//! ```

use crate::config::consts::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

pub mod messages;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or by `filter` when
/// `RUST_LOG` is unset (`None` means [`DEFAULT_LOG_FILTER`]).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
