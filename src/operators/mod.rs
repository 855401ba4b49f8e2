// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composable stream operators.

pub mod basic;
pub mod framing;
pub mod gates;
pub mod plex;
pub mod windows;

pub use basic::{dedupe, emit, filter, filter2, flat_map, map, reductions};
pub use framing::{after, detag, epilog, prolog, tag};
pub use gates::{drop, drop_all, drop_while, take, take_while};
pub use plex::{demultiplex, multiplex, shared};
pub use windows::{partition, trailing};
