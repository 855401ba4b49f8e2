// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod compiler;   // graph -> operator compilation
pub mod config;     // topology files
pub mod engine;     // async scheduler
pub mod errors;     // error handling
pub mod graph;      // topology structures + walk
pub mod observability;
pub mod operators;  // stream operator library
pub mod reducing;   // transformer protocol
pub mod traits;     // source/sink abstractions
pub mod value;

pub use compiler::{mapjoin, xfgraph};
pub use engine::{run, run_in, Environment};
pub use graph::{chain, graph, sink, source, walk, Graph, Link, NodeValue, PathRef};
pub use reducing::{is_reduced, reduced, transduce, unreduced, Transducer, Transformer};
pub use value::Value;
