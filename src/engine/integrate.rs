// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Binding a graph to live collaborators.
//!
//! [`integrate`] compiles a graph the same way [`xfgraph`](crate::compiler::xfgraph)
//! does, except that the ends are real: every sink node gets the operator the
//! `outputer` supplies, and every source root receives its compiled
//! transformer through the `inputer`, ready to be pumped.

use crate::compiler::{compose_graph, GraphHooks};
use crate::errors::CycleError;
use crate::graph::{Endpoint, Graph, NodeValue, Path, WalkContext};
use crate::observability::messages::engine::SourceNotRoot;
use crate::observability::messages::StructuredLog;
use crate::operators::multiplex;
use crate::reducing::{Transducer, Transformer};

struct Integration<O> {
    outputer: O,
}

impl<O> GraphHooks for Integration<O>
where
    O: Fn(&WalkContext<'_>, &Endpoint) -> Transducer,
{
    fn leaf(&self, ctx: &WalkContext<'_>, node: &NodeValue) -> Vec<Transducer> {
        match node.as_sink() {
            Some(endpoint) => vec![(self.outputer)(ctx, endpoint)],
            None => Vec::new(),
        }
    }

    fn operator(&self, ctx: &WalkContext<'_>, node: &NodeValue) -> Transducer {
        if let Some(endpoint) = node.as_source().filter(|_| !ctx.is_root) {
            SourceNotRoot {
                path: &ctx.name(),
                kind: &endpoint.kind,
            }
            .log();
        }
        match node.as_sink() {
            Some(endpoint) if !ctx.is_leaf => (self.outputer)(ctx, endpoint),
            _ => node.operator().cloned().unwrap_or_else(Transducer::identity),
        }
    }
}

/// Compile `g` against the given collaborators.
///
/// `outputer` is called once per sink node. A sink with downstream nodes
/// acts as a tap and passes its values on. `inputer` is called once per
/// source root with the root's compiled transformer.
///
/// Roots that are not sources have no input; their transformers are
/// finalized immediately so that nodes they share with source roots are
/// finalized once the sources finish. Returns the number of source roots.
pub fn integrate<I, O>(g: &Graph, mut inputer: I, outputer: O) -> Result<usize, CycleError>
where
    I: FnMut(&Path, &Endpoint, Transformer),
    O: Fn(&WalkContext<'_>, &Endpoint) -> Transducer,
{
    let roots = compose_graph(g, &Integration { outputer })?;

    // Every root is applied before any is finalized so that shared nodes are
    // built once for all of their parents.
    let applied: Vec<(Path, Transformer)> = roots
        .into_iter()
        .map(|(path, xfs)| {
            let rf = multiplex(xfs).apply(Transformer::terminal());
            (path, rf)
        })
        .collect();

    let mut sources = 0;
    let mut idle = Vec::new();
    for (path, rf) in applied {
        match g.node_at(&path).and_then(NodeValue::as_source) {
            Some(endpoint) => {
                sources += 1;
                inputer(&path, endpoint, rf);
            }
            None => idle.push(rf),
        }
    }

    for mut rf in idle {
        let acc = rf.init();
        rf.result(acc);
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{graph, sink, source, Link};
    use crate::operators::map;
    use crate::reducing::{transduce, Partial};
    use crate::value::Value;
    use std::sync::{Arc, Mutex};

    fn recorder(seen: Arc<Mutex<Vec<Value>>>, label: &'static str) -> Transducer {
        Transducer::new(move |down| {
            let seen = seen.clone();
            Partial::new().step(move |acc, v| {
                seen.lock().unwrap().push(Value::tagged(label, v.clone()));
                down.step(acc, v)
            })
        })
    }

    #[test]
    fn test_sources_reach_sinks() {
        let g = graph(
            vec![
                ("src", source("test", Value::Null)),
                ("double", NodeValue::op(map(|v| Value::Int(v.as_i64().unwrap() * 2)))),
                ("out", sink("test", Value::Null)),
            ],
            vec![Link::chain(["src", "double", "out"])],
        )
        .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut inputs = Vec::new();
        let outputer_seen = seen.clone();
        let count = integrate(
            &g,
            |path, endpoint, rf| inputs.push((path.clone(), endpoint.kind.clone(), rf)),
            |ctx, _| recorder(outputer_seen.clone(), if ctx.name() == "out" { "out" } else { "?" }),
        )
        .unwrap();

        assert_eq!(count, 1);
        let (path, kind, rf) = inputs.pop().unwrap();
        assert_eq!(path, vec!["src".to_string()]);
        assert_eq!(kind, "test");

        transduce(rf, Value::Null, vec![Value::Int(1), Value::Int(4)]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Value::tagged("out", 2i64), Value::tagged("out", 8i64)]
        );
    }

    #[test]
    fn test_tap_sink_passes_values_on() {
        let g = graph(
            vec![
                ("src", source("test", Value::Null)),
                ("tap", sink("test", Value::Null)),
                ("out", sink("test", Value::Null)),
            ],
            vec![Link::chain(["src", "tap", "out"])],
        )
        .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut inputs = Vec::new();
        let outputer_seen = seen.clone();
        integrate(
            &g,
            |_, _, rf| inputs.push(rf),
            |ctx, _| {
                let label = if ctx.is_leaf { "leaf" } else { "tap" };
                recorder(outputer_seen.clone(), label)
            },
        )
        .unwrap();

        let rf = inputs.pop().unwrap();
        transduce(rf, Value::Null, vec![Value::Int(7)]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Value::tagged("tap", 7i64), Value::tagged("leaf", 7i64)]
        );
    }

    #[test]
    fn test_non_source_roots_are_not_inputs() {
        let g = graph(
            vec![("a", NodeValue::value(43i64)), ("b", NodeValue::value(true))],
            vec![Link::new("a", "b")],
        )
        .unwrap();

        let mut called = 0;
        let count = integrate(&g, |_, _, _| called += 1, |_, _| Transducer::identity()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(called, 0);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_linked_source_passes_through_with_warning() {
        let g = graph(
            vec![
                ("src", source("test", Value::Null)),
                ("late", source("timer", Value::Null)),
                ("out", sink("test", Value::Null)),
            ],
            vec![Link::chain(["src", "late", "out"])],
        )
        .unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut inputs = Vec::new();
        let outputer_seen = seen.clone();
        let count = tracing::subscriber::with_default(subscriber, || {
            integrate(
                &g,
                |path, _, rf| inputs.push((path.clone(), rf)),
                |_, _| recorder(outputer_seen.clone(), "out"),
            )
            .unwrap()
        });

        assert_eq!(count, 1);
        let (path, rf) = inputs.pop().unwrap();
        assert_eq!(path, vec!["src".to_string()]);
        transduce(rf, Value::Null, vec![Value::Int(5)]);
        assert_eq!(*seen.lock().unwrap(), vec![Value::tagged("out", 5i64)]);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Source 'late' (timer) has incoming links"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let g = graph(
            vec![
                ("a", NodeValue::value(1i64)),
                ("b", NodeValue::value(2i64)),
            ],
            vec![Link::new("a", "b"), Link::new("b", "a")],
        )
        .unwrap();
        assert!(integrate(&g, |_, _, _| {}, |_, _| Transducer::identity()).is_err());
    }
}
