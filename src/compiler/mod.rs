// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod compose;
pub mod mapjoin;

pub use compose::{compose_graph, xfgraph, GraphHooks};
pub use mapjoin::{mapjoin, mapjoin_with_arity};
