// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConstructionError;
use crate::graph::{graph, node_ref, Graph, Link, NodeValue, OUT_PORT};
use crate::operators::map;
use crate::reducing::{ezducer, Emit, Ez};
use crate::value::Value;
use std::sync::Arc;

type JoinFn = dyn Fn(&[Value]) -> Value + Send + Sync;

struct Join {
    f: Arc<JoinFn>,
    actives: Arc<Vec<bool>>,
    slots: Vec<Value>,
    filled: Vec<bool>,
    needed: usize,
}

impl Join {
    fn new(f: Arc<JoinFn>, actives: Arc<Vec<bool>>, arity: usize) -> Self {
        Self {
            f,
            actives,
            slots: vec![Value::Null; arity],
            filled: vec![false; arity],
            needed: arity,
        }
    }

    fn is_active(&self, port: usize) -> bool {
        self.actives.get(port).copied().unwrap_or(true)
    }
}

impl Ez for Join {
    fn step(&mut self, value: Value) -> Vec<Emit> {
        let Some([port, inner]) = value.as_list() else {
            return Vec::new();
        };
        let Some(port) = port.as_i64().and_then(|p| usize::try_from(p).ok()) else {
            return Vec::new();
        };
        if port >= self.slots.len() {
            return Vec::new();
        }

        self.slots[port] = inner.clone();
        let fire = if self.filled[port] {
            self.needed == 0 && self.is_active(port)
        } else {
            self.filled[port] = true;
            self.needed -= 1;
            self.needed == 0
        };

        if fire {
            vec![Emit::Value((self.f)(&self.slots))]
        } else {
            Vec::new()
        }
    }
}

/// A join subgraph combining `arity` input streams with `f`.
///
/// Input ports are the nodes `"0"` to `"arity-1"`; the combined stream leaves
/// through `out`. `f` first fires once every input has produced a value, and
/// from then on whenever an active input produces one. Inputs without an
/// entry in `actives` are active; passive inputs only update the stored value.
pub fn mapjoin_with_arity<F>(arity: usize, f: F, actives: &[bool]) -> Result<Graph, ConstructionError>
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    let f: Arc<JoinFn> = Arc::new(f);
    let actives = Arc::new(actives.to_vec());

    let mut nodes: Vec<(String, NodeValue)> = (0..arity)
        .map(|port| {
            let index = Value::from(port);
            let label = map(move |v| Value::tagged(index.clone(), v));
            (port.to_string(), NodeValue::from(label))
        })
        .collect();
    let join = ezducer(move || Join::new(f.clone(), actives.clone(), arity));
    nodes.push((OUT_PORT.to_string(), NodeValue::from(join)));

    let links: Vec<Link> = (0..arity)
        .map(|port| Link::new(node_ref(&port.to_string()), node_ref(OUT_PORT)))
        .collect();

    graph(nodes, links)
}

/// [`mapjoin_with_arity`] with one input per entry of `actives`.
pub fn mapjoin<F>(f: F, actives: &[bool]) -> Result<Graph, ConstructionError>
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    mapjoin_with_arity(actives.len(), f, actives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::xfgraph;
    use crate::reducing::sequence;

    fn sum(values: &[Value]) -> Value {
        Value::Int(values.iter().filter_map(Value::as_i64).sum())
    }

    fn join_graph(join: Graph) -> Graph {
        graph(
            vec![
                ("a", NodeValue::from(Value::Null)),
                ("b", NodeValue::from(Value::Null)),
                ("c", NodeValue::from(Value::Null)),
                ("j", NodeValue::from(join)),
            ],
            vec![
                Link::new("a", node_ref("j").at("0")),
                Link::new("b", node_ref("j").at("1")),
                Link::new("j", "c"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_mapjoin_passive_input_only_updates_state() {
        let g = join_graph(mapjoin(sum, &[true, false]).unwrap());
        let xf = xfgraph(&g).unwrap();
        let out = sequence(
            &xf,
            vec![
                Value::tagged("a", 3),
                Value::tagged("b", 2),
                Value::tagged("b", 3),
                Value::tagged("b", 4),
                Value::tagged("a", 5),
            ],
        );
        assert_eq!(
            out,
            vec![Value::tagged("c", 5), Value::tagged("c", 9), Value::sentinel("c")]
        );
    }

    #[test]
    fn test_mapjoin_missing_flags_default_to_active() {
        let g = join_graph(mapjoin_with_arity(2, sum, &[]).unwrap());
        let xf = xfgraph(&g).unwrap();
        let out = sequence(
            &xf,
            vec![Value::tagged("a", 1), Value::tagged("b", 2), Value::tagged("b", 3)],
        );
        assert_eq!(
            out,
            vec![Value::tagged("c", 3), Value::tagged("c", 4), Value::sentinel("c")]
        );
    }

    #[test]
    fn test_mapjoin_waits_for_every_input() {
        let g = join_graph(mapjoin(sum, &[true, true]).unwrap());
        let xf = xfgraph(&g).unwrap();
        let out = sequence(&xf, vec![Value::tagged("a", 1), Value::tagged("a", 2)]);
        assert_eq!(out, vec![Value::sentinel("c")]);
    }
}
