// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::{Graph, PathRef};
use crate::reducing::Transducer;
use crate::value::Value;
use std::sync::Arc;

/// A named source or sink collaborator together with its configuration.
///
/// The scheduler looks `kind` up in its environment (`timer`, `log`, ...);
/// `config` is handed to the collaborator untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub kind: String,
    pub config: Value,
}

/// The payload of a plain (non-structural) node.
#[derive(Debug, Clone)]
pub enum Leaf {
    /// A stream operator
    Op(Transducer),
    /// Opaque data; compiles to a pass-through
    Value(Value),
    /// Marks a node the scheduler feeds from a live source
    Source(Endpoint),
    /// Marks a node the scheduler drains into a side effect
    Sink(Endpoint),
}

/// What a graph node holds.
#[derive(Debug, Clone)]
pub enum NodeValue {
    Leaf(Leaf),
    Subgraph(Arc<Graph>),
    Alias(PathRef),
}

impl NodeValue {
    pub fn op(xf: Transducer) -> Self {
        NodeValue::Leaf(Leaf::Op(xf))
    }

    pub fn value(v: impl Into<Value>) -> Self {
        NodeValue::Leaf(Leaf::Value(v.into()))
    }

    pub fn alias(target: PathRef) -> Self {
        NodeValue::Alias(target)
    }

    pub fn subgraph(g: Graph) -> Self {
        NodeValue::Subgraph(Arc::new(g))
    }

    /// The operator held by this node, if any.
    pub fn operator(&self) -> Option<&Transducer> {
        match self {
            NodeValue::Leaf(Leaf::Op(xf)) => Some(xf),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&Endpoint> {
        match self {
            NodeValue::Leaf(Leaf::Source(ep)) => Some(ep),
            _ => None,
        }
    }

    pub fn as_sink(&self) -> Option<&Endpoint> {
        match self {
            NodeValue::Leaf(Leaf::Sink(ep)) => Some(ep),
            _ => None,
        }
    }

    pub fn as_subgraph(&self) -> Option<&Arc<Graph>> {
        match self {
            NodeValue::Subgraph(g) => Some(g),
            _ => None,
        }
    }
}

/// Node marker for a live source of type `kind`.
pub fn source(kind: impl Into<String>, config: impl Into<Value>) -> NodeValue {
    NodeValue::Leaf(Leaf::Source(Endpoint {
        kind: kind.into(),
        config: config.into(),
    }))
}

/// Node marker for a side-effecting sink of type `kind`.
pub fn sink(kind: impl Into<String>, config: impl Into<Value>) -> NodeValue {
    NodeValue::Leaf(Leaf::Sink(Endpoint {
        kind: kind.into(),
        config: config.into(),
    }))
}

impl From<Transducer> for NodeValue {
    fn from(xf: Transducer) -> Self {
        NodeValue::op(xf)
    }
}

impl From<Graph> for NodeValue {
    fn from(g: Graph) -> Self {
        NodeValue::subgraph(g)
    }
}

impl From<PathRef> for NodeValue {
    fn from(target: PathRef) -> Self {
        NodeValue::alias(target)
    }
}

impl From<Value> for NodeValue {
    fn from(v: Value) -> Self {
        NodeValue::value(v)
    }
}

impl From<i64> for NodeValue {
    fn from(i: i64) -> Self {
        NodeValue::value(i)
    }
}

impl From<bool> for NodeValue {
    fn from(b: bool) -> Self {
        NodeValue::value(b)
    }
}

impl From<&str> for NodeValue {
    fn from(s: &str) -> Self {
        NodeValue::value(s)
    }
}
