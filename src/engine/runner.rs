// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Running a graph against live sources.
//!
//! Each source root gets its own tokio task. Inside the task the source's
//! producer and the pump share an unbounded channel:
//!
//! ```text
//! Source::produce ──mpsc──▶ pump: init, step..., result ──▶ compiled operators ──▶ sinks
//! ```
//!
//! The pump stops at the first reduced step, drops the receiver and calls
//! `result` exactly once. The producer is dropped as soon as the pump is
//! done or the environment is shut down, so a source never outlives its
//! stream. A panic in any task aborts its siblings and is re-raised on the
//! caller of [`run`].

use crate::engine::environment::Environment;
use crate::engine::integrate::integrate;
use crate::engine::sinks::{sink_operator, InertSink};
use crate::engine::sources::InertSource;
use crate::errors::RunError;
use crate::graph::{Endpoint, Graph, WalkContext};
use crate::observability::messages::engine::{
    RunCompleted, RunStarted, SourceFinished, SourceStarted, UnknownCollaborator,
};
use crate::observability::messages::StructuredLog;
use crate::reducing::{Step, Transducer, Transformer};
use crate::traits::{Sink, SinkContext, Source, SourceContext};
use crate::value::Value;
use std::cell::Cell;
use std::panic;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;

struct Pump {
    kind: String,
    source: Arc<dyn Source>,
    ctx: SourceContext,
    rf: Transformer,
}

/// Run `g` in a fresh default environment with `args` as run arguments.
///
/// Resolves once every source has finished and every nested run has
/// resolved.
///
/// ```no_run
/// use dagstream::engine::run;
/// use dagstream::graph::{graph, Link};
///
/// # async fn demo() {
/// let g = graph(Vec::<(&str, i64)>::new(), Vec::<Link>::new()).unwrap();
/// run(&g, dagstream::value::Value::Null).await.unwrap();
/// # }
/// ```
pub async fn run(g: &Graph, args: impl Into<Value>) -> Result<(), RunError> {
    let env = Environment::builder().args(args).build();
    run_in(&env, g).await
}

fn sink_for(env: &Environment, ctx: &WalkContext<'_>, endpoint: &Endpoint) -> Transducer {
    let path = ctx.name();
    let sink: Arc<dyn Sink> = match env.sink(&endpoint.kind) {
        Some(sink) => sink,
        None => {
            UnknownCollaborator {
                role: "sink",
                kind: &endpoint.kind,
                path: &path,
            }
            .log();
            Arc::new(InertSink)
        }
    };
    sink_operator(
        sink,
        SinkContext {
            path,
            config: endpoint.config.clone(),
            env: env.clone(),
        },
    )
}

fn source_for(env: &Environment, path: &str, endpoint: &Endpoint) -> Arc<dyn Source> {
    match env.source(&endpoint.kind) {
        Some(source) => source,
        None => {
            UnknownCollaborator {
                role: "source",
                kind: &endpoint.kind,
                path,
            }
            .log();
            Arc::new(InertSource)
        }
    }
}

/// Run `g` in `env`.
///
/// Sources and sinks are looked up in `env`; unknown kinds are replaced by
/// inert placeholders with a warning.
pub async fn run_in(env: &Environment, g: &Graph) -> Result<(), RunError> {
    let started = Instant::now();

    let (pumps, sinks) = {
        let mut pumps = Vec::new();
        let sink_count = Cell::new(0usize);
        integrate(
            g,
            |path, endpoint, rf| {
                let path = path.join(".");
                pumps.push(Pump {
                    kind: endpoint.kind.clone(),
                    source: source_for(env, &path, endpoint),
                    ctx: SourceContext {
                        path,
                        config: endpoint.config.clone(),
                        env: env.clone(),
                    },
                    rf,
                });
            },
            |ctx, endpoint| {
                sink_count.set(sink_count.get() + 1);
                sink_for(env, ctx, endpoint)
            },
        )?;
        (pumps, sink_count.get())
    };

    let sources = pumps.len();
    let started_msg = RunStarted { sources, sinks };
    started_msg.log();
    let run_span = started_msg.span("run_in");

    let mut tasks = JoinSet::new();
    for p in pumps {
        tasks.spawn(pump(p).instrument(run_span.clone()));
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            if err.is_panic() {
                tasks.abort_all();
                panic::resume_unwind(err.into_panic());
            }
        }
    }

    env.join_nested().await;

    RunCompleted {
        sources,
        duration: started.elapsed(),
    }
    .log();
    Ok(())
}

async fn pump(p: Pump) {
    let Pump {
        kind,
        source,
        ctx,
        mut rf,
    } = p;
    let path = ctx.path.clone();
    let token = ctx.env.token().clone();
    let started_msg = SourceStarted {
        path: &path,
        kind: &kind,
    };
    started_msg.log();
    let span = started_msg.span("pump");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut produce = source.produce(ctx, tx);
    let mut consume = Box::pin(async move {
        let mut acc = rf.init();
        let mut values = 0usize;
        let mut reduced = false;
        while let Some(value) = rx.recv().await {
            values += 1;
            match rf.step(acc, value) {
                Step::Continue(next) => acc = next,
                Step::Reduced(last) => {
                    acc = last;
                    reduced = true;
                    break;
                }
            }
        }
        drop(rx);
        rf.result(acc);
        (values, reduced)
    });

    let (values, reduced) = async move {
        let finished = tokio::select! {
            biased;
            outcome = &mut consume => Some(outcome),
            _ = &mut produce => None,
            _ = token.cancelled() => None,
        };
        // Dropping the producer releases its sender so the pump can drain.
        drop(produce);
        match finished {
            Some(outcome) => outcome,
            None => consume.await,
        }
    }
    .instrument(span)
    .await;

    SourceFinished {
        path: &path,
        kind: &kind,
        values,
        reduced,
    }
    .log();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{graph, sink, source, Link, NodeValue};
    use crate::operators::take;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Counting(i64);

    #[async_trait]
    impl Source for Counting {
        async fn produce(&self, _ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
            for i in 0..self.0 {
                if tx.send(Value::Int(i)).is_err() {
                    return;
                }
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Endless;

    #[async_trait]
    impl Source for Endless {
        async fn produce(&self, _ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
            let mut i = 0;
            while tx.send(Value::Int(i)).is_ok() {
                i += 1;
                tokio::task::yield_now().await;
            }
        }

        fn name(&self) -> &'static str {
            "endless"
        }
    }

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Value>>>);

    struct CollectWriter(Arc<Mutex<Vec<Value>>>);

    impl crate::traits::SinkWriter for CollectWriter {
        fn write(&mut self, value: Value) {
            self.0.lock().unwrap().push(value);
        }
    }

    impl Sink for Collect {
        fn open(&self, _ctx: SinkContext) -> Box<dyn crate::traits::SinkWriter> {
            Box::new(CollectWriter(self.0.clone()))
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    #[tokio::test]
    async fn test_pump_stops_at_reduced_and_cancels_source() {
        let collected = Collect::default();
        let env = Environment::builder()
            .source(Endless)
            .sink(collected.clone())
            .build();
        let g = graph(
            vec![
                ("src", source("endless", Value::Null)),
                ("first", NodeValue::op(take(3))),
                ("out", sink("collect", Value::Null)),
            ],
            vec![Link::chain(["src", "first", "out"])],
        )
        .unwrap();

        run_in(&env, &g).await.unwrap();
        assert_eq!(
            *collected.0.lock().unwrap(),
            vec![Value::Int(0), Value::Int(1), Value::Int(2)]
        );
    }

    #[tokio::test]
    async fn test_exhausted_source_drains_everything() {
        let collected = Collect::default();
        let env = Environment::builder()
            .source(Counting(4))
            .sink(collected.clone())
            .build();
        let g = graph(
            vec![
                ("src", source("counting", Value::Null)),
                ("out", sink("collect", Value::Null)),
            ],
            vec![Link::new("src", "out")],
        )
        .unwrap();

        run_in(&env, &g).await.unwrap();
        assert_eq!(collected.0.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_stops_endless_source() {
        let env = Environment::builder().source(Endless).build();
        let g = graph(
            vec![
                ("src", source("endless", Value::Null)),
                ("out", sink("debug", Value::Null)),
            ],
            vec![Link::new("src", "out")],
        )
        .unwrap();

        let stopper = env.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            stopper.shutdown();
        });
        run_in(&env, &g).await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "operator failure")]
    async fn test_operator_panic_is_reraised() {
        let env = Environment::builder().source(Counting(1)).build();
        let g = graph(
            vec![
                ("src", source("counting", Value::Null)),
                (
                    "boom",
                    NodeValue::op(crate::operators::map(|_| panic!("operator failure"))),
                ),
                ("out", sink("debug", Value::Null)),
            ],
            vec![Link::chain(["src", "boom", "out"])],
        )
        .unwrap();
        let _ = run_in(&env, &g).await;
    }
}
