// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for topology file loading.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A topology file was parsed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use dagstream::observability::messages::config::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     path: "configs/ticker.yaml",
///     node_count: 3,
///     link_count: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub node_count: usize,
    pub link_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded topology '{}': {} nodes, {} links",
            self.path, self.node_count, self.link_count
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            node_count = self.node_count,
            link_count = self.link_count,
            "{}", self
        );
    }
}
