// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for topology compilation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A graph was compiled into operators.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct GraphCompiled<'a> {
    pub roots: &'a [String],
}

impl Display for GraphCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled graph with {} roots: [{}]",
            self.roots.len(),
            self.roots.join(", ")
        )
    }
}

impl StructuredLog for GraphCompiled<'_> {
    fn log(&self) {
        tracing::debug!(
            root_count = self.roots.len(),
            roots = self.roots.join(","),
            "{}", self
        );
    }
}

/// A walk found a real dependency cycle.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use dagstream::observability::messages::graph::CycleDetected;
///
/// let cycle = vec!["a".to_string(), "s.b".to_string(), "a".to_string()];
/// let msg = CycleDetected { cycle: &cycle };
///
/// assert_eq!(msg.to_string(), "Cyclic dependency detected: a -> s.b -> a");
/// ```
pub struct CycleDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }
}
