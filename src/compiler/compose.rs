// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiling a graph into operators.
//!
//! The graph is walked leaf-to-root. Each node receives the list of
//! operators its children compiled to and hands a new list to its parents:
//!
//! - a leaf seeds the list from [`GraphHooks::leaf`]
//! - a node holding an operator puts it in front of its children's operators
//! - a node with several parents is wrapped in [`shared`] so that its
//!   downstream is finalized once, after every parent has finished
//! - a root puts [`GraphHooks::root`] in front of everything
//!
//! [`xfgraph`] uses the tagging convention for both ends, producing one
//! operator that routes `[root, v]` inputs to their roots and emits
//! `[leaf, v]` outputs, each leaf's stream closed by `[leaf]`.

use crate::errors::CycleError;
use crate::graph::{walk, Direction, Graph, NodeValue, Path, WalkContext};
use crate::observability::messages::graph::{CycleDetected, GraphCompiled};
use crate::observability::messages::StructuredLog;
use crate::operators::{detag, multiplex, shared, tag};
use crate::reducing::Transducer;

/// Customization points for [`compose_graph`].
pub trait GraphHooks {
    /// Operator placed in front of a root's compiled operators.
    fn root(&self, _ctx: &WalkContext<'_>, _node: &NodeValue) -> Transducer {
        Transducer::identity()
    }

    /// Operators that consume a leaf's output.
    fn leaf(&self, _ctx: &WalkContext<'_>, _node: &NodeValue) -> Vec<Transducer> {
        Vec::new()
    }

    /// The operator a node contributes.
    fn operator(&self, _ctx: &WalkContext<'_>, node: &NodeValue) -> Transducer {
        node.operator().cloned().unwrap_or_else(Transducer::identity)
    }
}

/// Compile `g` into one operator list per root, in root discovery order.
pub fn compose_graph<H: GraphHooks>(
    g: &Graph,
    hooks: &H,
) -> Result<Vec<(Path, Vec<Transducer>)>, CycleError> {
    walk(g, Direction::Forward, |children: Vec<Vec<Transducer>>, node, ctx| {
        let mut list: Vec<Transducer> = if ctx.is_leaf {
            hooks.leaf(ctx, node)
        } else {
            children.into_iter().flatten().collect()
        };

        let op = hooks.operator(ctx, node);
        if !op.is_identity() && !list.is_empty() {
            list = vec![op.then(multiplex(list))];
        }

        if ctx.parents.len() > 1 && !list.is_empty() {
            list = vec![shared(ctx.parents.len(), multiplex(list))];
        }

        if ctx.is_root && !list.is_empty() {
            list = vec![hooks.root(ctx, node).then(multiplex(list))];
        }

        list
    })
}

struct Tagging;

impl GraphHooks for Tagging {
    fn root(&self, ctx: &WalkContext<'_>, _node: &NodeValue) -> Transducer {
        detag(ctx.name())
    }

    fn leaf(&self, ctx: &WalkContext<'_>, _node: &NodeValue) -> Vec<Transducer> {
        vec![tag(ctx.name())]
    }
}

/// Compile `g` into a single operator speaking the tagging convention.
///
/// Nested node names are dotted, so a root `r` inside subgraph `s` accepts
/// `["s.r", v]`.
pub fn xfgraph(g: &Graph) -> Result<Transducer, CycleError> {
    let roots = compose_graph(g, &Tagging).inspect_err(|err| {
        let cycle: Vec<String> = err.cycle.iter().map(|p| p.join(".")).collect();
        CycleDetected { cycle: &cycle }.log();
    })?;
    let names: Vec<String> = roots.iter().map(|(path, _)| path.join(".")).collect();
    GraphCompiled { roots: &names }.log();
    Ok(multiplex(roots.into_iter().flat_map(|(_, xfs)| xfs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{graph, Link};
    use crate::operators::{map, take};
    use crate::reducing::sequence;
    use crate::value::Value;

    fn plus_one() -> Transducer {
        map(|v| Value::Int(v.as_i64().unwrap_or(0) + 1))
    }

    fn diamond() -> Graph {
        graph(
            vec![
                ("a", NodeValue::from(Value::Null)),
                ("b", NodeValue::from(Value::Null)),
                ("c", NodeValue::from(plus_one())),
                ("d", NodeValue::from(take(1))),
            ],
            vec![("a", "c"), ("a", "d"), ("b", "d")],
        )
        .unwrap()
    }

    #[test]
    fn test_xfgraph_diamond() {
        let xf = xfgraph(&diamond()).unwrap();
        let out = sequence(&xf, vec![Value::tagged("a", 3), Value::tagged("b", 2)]);
        assert_eq!(
            out,
            vec![
                Value::tagged("c", 4),
                Value::tagged("d", 3),
                Value::sentinel("d"),
                Value::sentinel("c"),
            ]
        );
    }

    #[test]
    fn test_xfgraph_can_be_applied_twice() {
        let xf = xfgraph(&diamond()).unwrap();
        let input = vec![Value::tagged("a", 3), Value::tagged("b", 2)];
        let first = sequence(&xf, input.clone());
        let second = sequence(&xf, input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_xfgraph_empty_graph_is_identity() {
        let xf = xfgraph(&Graph::default()).unwrap();
        assert!(xf.is_identity());
    }

    #[test]
    fn test_xfgraph_names_nested_nodes_with_dots() {
        let inner = crate::graph::chain(vec![NodeValue::from(plus_one())]).unwrap();
        let g = graph(
            vec![("in", NodeValue::from(Value::Null)), ("s", NodeValue::from(inner))],
            vec![("in", "s")],
        )
        .unwrap();
        let xf = xfgraph(&g).unwrap();
        let out = sequence(&xf, vec![Value::tagged("in", 1)]);
        assert_eq!(out, vec![Value::tagged("s.0", 2), Value::sentinel("s.0")]);
    }

    #[test]
    fn test_xfgraph_reports_cycles() {
        let g = graph(
            vec![
                ("a", NodeValue::from(Value::Null)),
                ("b", NodeValue::from(plus_one())),
                ("c", NodeValue::from(plus_one())),
            ],
            vec![Link::chain(vec!["a", "b", "c", "b"])],
        )
        .unwrap();
        assert!(xfgraph(&g).is_err());
    }

    struct CountingLeaves;

    impl GraphHooks for CountingLeaves {
        fn leaf(&self, _ctx: &WalkContext<'_>, _node: &NodeValue) -> Vec<Transducer> {
            vec![Transducer::identity()]
        }
    }

    #[test]
    fn test_compose_graph_returns_one_list_per_root() {
        let roots = compose_graph(&diamond(), &CountingLeaves).unwrap();
        let names: Vec<String> = roots.iter().map(|(p, _)| p.join(".")).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(roots.iter().all(|(_, xfs)| xfs.len() == 1));
    }
}
