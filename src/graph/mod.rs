// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology data structures: symbolic paths, nodes, graph construction and
//! the topological walk.

pub mod builder;
pub mod node;
pub mod path;
pub mod walk;

pub use builder::{chain, graph, node_ref, Graph, Link, IN_PORT, OUT_PORT};
pub use node::{sink, source, Endpoint, Leaf, NodeValue};
pub use path::{deref, normalize, root, Path, PathRef, Target};
pub use walk::{walk, Direction, WalkContext};
