// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::Path;
use thiserror::Error;

fn dotted(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

fn arrowed(paths: &[Vec<String>]) -> String {
    paths.iter().map(|p| dotted(p)).collect::<Vec<_>>().join(" -> ")
}

/// Errors raised while building a [`Graph`](crate::graph::Graph) from nodes and links.
///
/// Every variant names the link endpoint being resolved (`endpoint`) so that a
/// typo deep inside a nested subgraph can be traced back to the link that used it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// A link endpoint names a node that does not exist
    #[error("link endpoint '{}' names undefined node '{name}'", dotted(.endpoint))]
    UndefinedNode { endpoint: Path, name: String },

    /// A link endpoint continues past a node that is not a subgraph
    #[error("link endpoint '{}' descends into '{name}', which is not a subgraph", dotted(.endpoint))]
    NotASubgraph { endpoint: Path, name: String },

    /// Alias resolution revisited a path it had already followed
    #[error("link endpoint '{}' resolves through an alias loop: {}", dotted(.endpoint), arrowed(.chain))]
    AliasLoop { endpoint: Path, chain: Vec<Path> },

    /// A subgraph used as an endpoint has no boundary node for the required port
    #[error("subgraph '{subgraph}' used by link endpoint '{}' has no '{port}' boundary node", dotted(.endpoint))]
    MissingBoundary {
        endpoint: Path,
        subgraph: String,
        port: String,
    },

    /// A link endpoint with no segments at all
    #[error("link endpoint is empty")]
    EmptyPath,
}

/// A real dependency cycle found while walking a graph.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cyclic dependency detected: {}", arrowed(.cycle))]
pub struct CycleError {
    /// The cycle path, closed by repeating its first element
    pub cycle: Vec<Path>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        s.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_cycle_error_display() {
        let err = CycleError {
            cycle: vec![p("a"), p("s.b"), p("a")],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: a -> s.b -> a");
    }

    #[test]
    fn test_construction_error_display() {
        let err = ConstructionError::MissingBoundary {
            endpoint: p("s"),
            subgraph: "s".into(),
            port: "in".into(),
        };
        assert_eq!(
            err.to_string(),
            "subgraph 's' used by link endpoint 's' has no 'in' boundary node"
        );
    }
}
