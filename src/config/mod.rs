// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology files.
//!
//! A topology can be declared in YAML or TOML instead of code. Nodes are
//! tagged by `kind`:
//!
//! ```yaml
//! options:
//!   timer_interval_ms: 500
//! nodes:
//!   tick:  { kind: source, type: timer, config: 100 }
//!   first: { kind: op, op: take, args: 3 }
//!   out:   { kind: sink, type: log }
//! links:
//!   - [tick, first, out]
//! ```
//!
//! Operators are named library operators with JSON arguments (see
//! [`operators`]); nested graphs use `kind: graph` with their own `nodes`
//! and `links`, and link endpoints are dotted paths.

mod loader;
pub mod operators;

pub mod consts;

pub use loader::{load_config, load_graph, Config, NodeConfig, RunOptions, SubgraphConfig};
pub use operators::build_operator;
