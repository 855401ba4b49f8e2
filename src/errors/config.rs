// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConstructionError;
use thiserror::Error;

/// Errors that can occur while turning a topology config into a graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An `op` node names an operator the library does not provide
    #[error("node '{node}' uses unknown operator '{op}'")]
    UnknownOperator { node: String, op: String },

    /// An operator received arguments of the wrong shape
    #[error("node '{node}': operator '{op}' {reason}")]
    InvalidArguments {
        node: String,
        op: String,
        reason: String,
    },

    /// A link in the config is shorter than two endpoints
    #[error("link {index} needs at least two endpoints, got {len}")]
    ShortLink { index: usize, len: usize },

    /// The declared topology failed graph construction
    #[error("invalid topology: {0}")]
    Construction(#[from] ConstructionError),
}
