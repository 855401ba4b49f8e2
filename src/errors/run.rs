// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::CycleError;
use thiserror::Error;

/// Errors that abort a run before its sources are started.
///
/// Panics raised by user operators are not represented here: they are
/// re-raised on the task awaiting the run. Failures of nested runs are
/// logged by the `run` sink and never reach the parent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The topology could not be compiled
    #[error("cannot compile topology: {0}")]
    Cycle(#[from] CycleError),
}
