// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in sinks and the operator that attaches a sink to a node.
//!
//! | Kind | Effect per value |
//! |---|---|
//! | `log` | `info!` event |
//! | `debug` | `debug!` event |
//! | `dir` | creates the directory named by the value |
//! | `pipe` | writes into the named pipe |
//! | `run` | runs an embedded graph in a child environment |

use crate::engine::environment::Environment;
use crate::engine::pipes::PipeWriter;
use crate::engine::runner::run_in;
use crate::engine::sources::pipe_name;
use crate::graph::Graph;
use crate::observability::messages::engine::{
    DirectoryOperationFailed, NestedRunFailed, NothingToRun,
};
use crate::observability::messages::StructuredLog;
use crate::reducing::{lock, Partial, Transducer};
use crate::traits::{Sink, SinkContext, SinkWriter};
use crate::value::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Pass every value through unchanged after showing it to `sink`.
///
/// The writer is opened each time the operator is applied and closed when
/// the stream completes.
pub fn sink_operator(sink: Arc<dyn Sink>, ctx: SinkContext) -> Transducer {
    Transducer::new(move |down| {
        let writer = Arc::new(Mutex::new(sink.open(ctx.clone())));
        let (step_writer, step_down) = (writer.clone(), down.clone());

        Partial::new()
            .step(move |acc, v| {
                lock(&step_writer).write(v.clone());
                step_down.step(acc, v)
            })
            .result(move |acc| {
                lock(&writer).close();
                down.result(acc)
            })
    })
}

struct EventWriter {
    path: String,
    verbose: bool,
}

impl SinkWriter for EventWriter {
    fn write(&mut self, value: Value) {
        if self.verbose {
            tracing::debug!(sink = %self.path, "{}", value);
        } else {
            tracing::info!(sink = %self.path, "{}", value);
        }
    }
}

/// Logs each value at `info` level.
pub struct LogSink;

impl Sink for LogSink {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter> {
        Box::new(EventWriter {
            path: ctx.path,
            verbose: false,
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Logs each value at `debug` level.
pub struct DebugSink;

impl Sink for DebugSink {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter> {
        Box::new(EventWriter {
            path: ctx.path,
            verbose: true,
        })
    }

    fn name(&self) -> &'static str {
        "debug"
    }
}

struct DirWriter {
    env: Environment,
}

impl SinkWriter for DirWriter {
    fn write(&mut self, value: Value) {
        let Some(path) = value.as_str() else {
            tracing::debug!(value = %value, "dir sink ignores non-string value");
            return;
        };
        let path = path.to_string();
        // Joined by `run_in` before it resolves.
        self.env.spawn_nested(async move {
            if let Err(error) = tokio::fs::create_dir_all(&path).await {
                DirectoryOperationFailed {
                    operation: "create",
                    path: &path,
                    error: &error,
                }
                .log();
            }
        });
    }
}

/// Creates every directory path it receives, parents included.
pub struct DirSink;

impl Sink for DirSink {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter> {
        Box::new(DirWriter { env: ctx.env })
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}

struct PipeSinkWriter {
    writer: Option<PipeWriter>,
}

impl SinkWriter for PipeSinkWriter {
    fn write(&mut self, value: Value) {
        if let Some(writer) = &self.writer {
            writer.write(value);
        }
    }

    fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.finish();
        }
    }
}

/// Writes into the named pipe given as config.
///
/// Only the first sink to open a pipe becomes its writer; later ones are
/// inert. Closing the sink ends the pipe's stream.
pub struct PipeSink;

impl Sink for PipeSink {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter> {
        let writer = match pipe_name(&ctx.config) {
            Some(name) => ctx.env.pipes().open(name).claim_writer(),
            None => {
                tracing::warn!(path = %ctx.path, "pipe sink has no pipe name, dropping values");
                None
            }
        };
        Box::new(PipeSinkWriter { writer })
    }

    fn name(&self) -> &'static str {
        "pipe"
    }
}

type NestedRun = Pin<Box<dyn Future<Output = ()> + Send>>;

fn nested_run(path: String, env: Environment, g: Arc<Graph>) -> NestedRun {
    Box::pin(async move {
        if let Err(error) = run_in(&env, &g).await {
            NestedRunFailed {
                path: &path,
                error: &error,
            }
            .log();
        }
    })
}

struct RunWriter {
    ctx: SinkContext,
}

impl SinkWriter for RunWriter {
    fn write(&mut self, value: Value) {
        let (g, args) = match (value, self.ctx.config.as_graph()) {
            (Value::Graph(g), _) => (g, Value::Null),
            (args, Some(configured)) => (configured.clone(), args),
            (_, None) => {
                NothingToRun {
                    path: &self.ctx.path,
                }
                .log();
                return;
            }
        };
        let child = self.ctx.env.child(args);
        self.ctx
            .env
            .spawn_nested(nested_run(self.ctx.path.clone(), child, g));
    }
}

/// Runs graphs.
///
/// A received graph value runs with no arguments. Any other value runs the
/// graph configured on the node, with the value as arguments. Each nested
/// run gets a child environment; the parent run waits for it.
pub struct RunSink;

impl Sink for RunSink {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter> {
        Box::new(RunWriter { ctx })
    }

    fn name(&self) -> &'static str {
        "run"
    }
}

/// Stands in for an unknown sink kind; discards everything.
pub struct InertSink;

struct Discard;

impl SinkWriter for Discard {
    fn write(&mut self, _value: Value) {}
}

impl Sink for InertSink {
    fn open(&self, _ctx: SinkContext) -> Box<dyn SinkWriter> {
        Box::new(Discard)
    }

    fn name(&self) -> &'static str {
        "inert"
    }
}
