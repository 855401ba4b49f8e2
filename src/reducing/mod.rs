// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The reducing protocol and its convenience constructors.

pub mod ezducer;
pub mod protocol;

pub(crate) use protocol::lock;

pub use ezducer::{ezducer, Emit, Ez};
pub use protocol::{
    collector, is_reduced, reduced, sequence, transduce, unreduced, Downstream, Partial, Step,
    Transducer, Transformer,
};
