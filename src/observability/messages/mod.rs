// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit itself with typed fields at its own level.
//!
//! # Organization
//!
//! * `graph` - topology compilation events
//! * `engine` - run lifecycle, sources, sinks and pipes
//! * `config` - topology file loading
//!
//! # Usage Pattern
//!
//! ```rust
//! use dagstream::observability::messages::engine::RunStarted;
//! use dagstream::observability::messages::StructuredLog;
//!
//! let msg = RunStarted {
//!     sources: 2,
//!     sinks: 1,
//! };
//!
//! tracing::info!("{}", msg);
//! msg.log();
//! ```

use tracing::Span;

pub mod config;
pub mod engine;
pub mod graph;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message fields. Messages that never scope
    /// work get a bare span named after the caller.
    fn span(&self, name: &str) -> Span {
        tracing::info_span!("event", span_name = name)
    }
}
