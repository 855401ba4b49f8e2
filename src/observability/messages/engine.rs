// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the scheduler.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, completion, nested runs)
//! * Sources and sinks (start, finish, unknown kinds, side-effect failures)
//! * Named pipes (refused claims, dropped writes)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A run was integrated and its sources are about to start.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dagstream::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     sources: 2,
///     sinks: 1,
/// };
///
/// assert_eq!(msg.to_string(), "Starting run: 2 sources, 1 sinks");
/// ```
pub struct RunStarted {
    pub sources: usize,
    pub sinks: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run: {} sources, {} sinks",
            self.sources, self.sinks
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(sources = self.sources, sinks = self.sinks, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            sources = self.sources,
            sinks = self.sinks,
        )
    }
}

/// Every source of a run has finished and nested runs have resolved.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dagstream::observability::messages::engine::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     sources: 3,
///     duration: Duration::from_millis(1500),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunCompleted {
    pub sources: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run completed: {} sources drained in {:?}",
            self.sources, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            sources = self.sources,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A source task started pumping into its root.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct SourceStarted<'a> {
    pub path: &'a str,
    pub kind: &'a str,
}

impl Display for SourceStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Source '{}' ({}) started", self.path, self.kind)
    }
}

impl StructuredLog for SourceStarted<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("source", span_name = name, path = self.path, kind = self.kind)
    }
}

/// A source task finalized its root.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct SourceFinished<'a> {
    pub path: &'a str,
    pub kind: &'a str,
    pub values: usize,
    /// Whether the operators stopped the stream before the source ran dry
    pub reduced: bool,
}

impl Display for SourceFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let how = if self.reduced { "reduced" } else { "exhausted" };
        write!(
            f,
            "Source '{}' ({}) {} after {} values",
            self.path, self.kind, how, self.values
        )
    }
}

impl StructuredLog for SourceFinished<'_> {
    fn log(&self) {
        tracing::debug!(
            path = self.path,
            kind = self.kind,
            values = self.values,
            reduced = self.reduced,
            "{}", self
        );
    }
}

/// A source or sink kind is not registered in the environment.
///
/// # Log Level
/// `warn!` - The node is replaced by an inert placeholder
///
/// # Example
/// ```
/// use dagstream::observability::messages::engine::UnknownCollaborator;
///
/// let msg = UnknownCollaborator {
///     role: "sink",
///     kind: "kafka",
///     path: "out",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Unknown sink 'kafka' at 'out', using an inert placeholder"
/// );
/// ```
pub struct UnknownCollaborator<'a> {
    /// `source` or `sink`
    pub role: &'a str,
    pub kind: &'a str,
    pub path: &'a str,
}

impl Display for UnknownCollaborator<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unknown {} '{}' at '{}', using an inert placeholder",
            self.role, self.kind, self.path
        )
    }
}

impl StructuredLog for UnknownCollaborator<'_> {
    fn log(&self) {
        tracing::warn!(role = self.role, kind = self.kind, path = self.path, "{}", self);
    }
}

/// A source node has incoming links, so it is never pumped and only passes
/// values through.
///
/// # Log Level
/// `warn!` - Likely a miswired topology
pub struct SourceNotRoot<'a> {
    pub path: &'a str,
    pub kind: &'a str,
}

impl Display for SourceNotRoot<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Source '{}' ({}) has incoming links and will not produce, passing values through",
            self.path, self.kind
        )
    }
}

impl StructuredLog for SourceNotRoot<'_> {
    fn log(&self) {
        tracing::warn!(path = self.path, kind = self.kind, "{}", self);
    }
}

/// A value written to a pipe was discarded.
///
/// # Log Level
/// `warn!` - Data loss the caller should know about
pub struct PipeWriteDropped<'a> {
    pub pipe: &'a str,
    pub reason: &'a str,
}

impl Display for PipeWriteDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dropped write to pipe '{}': {}", self.pipe, self.reason)
    }
}

impl StructuredLog for PipeWriteDropped<'_> {
    fn log(&self) {
        tracing::warn!(pipe = self.pipe, reason = self.reason, "{}", self);
    }
}

/// A second writer or reader tried to attach to a pipe.
///
/// # Log Level
/// `warn!` - The extra endpoint is inert
pub struct PipeClaimRejected<'a> {
    pub pipe: &'a str,
    /// `writer` or `reader`
    pub side: &'a str,
}

impl Display for PipeClaimRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipe '{}' already has a {}, ignoring this one",
            self.pipe, self.side
        )
    }
}

impl StructuredLog for PipeClaimRejected<'_> {
    fn log(&self) {
        tracing::warn!(pipe = self.pipe, side = self.side, "{}", self);
    }
}

/// A graph received by a `run` sink could not be executed.
///
/// # Log Level
/// `error!` - The nested run is skipped
pub struct NestedRunFailed<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NestedRunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Nested run from sink '{}' failed: {}", self.path, self.error)
    }
}

impl StructuredLog for NestedRunFailed<'_> {
    fn log(&self) {
        tracing::error!(path = self.path, error = %self.error, "{}", self);
    }
}

/// A `run` sink received something that is not a graph and has no graph configured.
///
/// # Log Level
/// `warn!` - The value is ignored
pub struct NothingToRun<'a> {
    pub path: &'a str,
}

impl Display for NothingToRun<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run sink '{}' received a non-graph value and has no configured graph",
            self.path
        )
    }
}

impl StructuredLog for NothingToRun<'_> {
    fn log(&self) {
        tracing::warn!(path = self.path, "{}", self);
    }
}

/// A filesystem operation performed by a `dir` source or sink failed.
///
/// # Log Level
/// `warn!` - The offending value is skipped
pub struct DirectoryOperationFailed<'a> {
    /// `read` or `create`
    pub operation: &'a str,
    pub path: &'a str,
    pub error: &'a std::io::Error,
}

impl Display for DirectoryOperationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to {} directory '{}': {}",
            self.operation, self.path, self.error
        )
    }
}

impl StructuredLog for DirectoryOperationFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            path = self.path,
            error = %self.error,
            "{}", self
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_and_source_spans_carry_fields() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let run = RunStarted { sources: 2, sinks: 1 }.span("run_in");
            let metadata = run.metadata().expect("run span enabled");
            assert_eq!(metadata.name(), "run");
            assert!(metadata.fields().field("sources").is_some());

            let source = SourceStarted {
                path: "tick",
                kind: "timer",
            }
            .span("pump");
            let metadata = source.metadata().expect("source span enabled");
            assert_eq!(metadata.name(), "source");
            assert!(metadata.fields().field("path").is_some());
        });
    }

    #[test]
    fn test_source_finished_reports_how_it_ended() {
        let reduced = SourceFinished {
            path: "tick",
            kind: "timer",
            values: 3,
            reduced: true,
        };
        assert_eq!(reduced.to_string(), "Source 'tick' (timer) reduced after 3 values");

        let exhausted = SourceFinished {
            reduced: false,
            ..reduced
        };
        assert_eq!(
            exhausted.to_string(),
            "Source 'tick' (timer) exhausted after 3 values"
        );
    }

    #[test]
    fn test_directory_failure_message() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let msg = DirectoryOperationFailed {
            operation: "read",
            path: "/nowhere",
            error: &error,
        };
        assert_eq!(msg.to_string(), "Failed to read directory '/nowhere': missing");
    }
}
