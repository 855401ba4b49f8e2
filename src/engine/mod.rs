// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The asynchronous scheduler: environments, built-in sources and sinks,
//! named pipes, and the runner that pumps sources through a compiled graph.

pub mod environment;
pub mod integrate;
pub mod pipes;
pub mod runner;
pub mod sinks;
pub mod sources;

pub use environment::{Environment, EnvironmentBuilder};
pub use integrate::integrate;
pub use pipes::{Pipe, PipeRegistry, PipeWriter};
pub use runner::{run, run_in};
pub use sinks::sink_operator;
