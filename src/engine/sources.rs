// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in sources.
//!
//! | Kind | Emits |
//! |---|---|
//! | `init` | one map `{args, env}` |
//! | `timer` | epoch milliseconds at a fixed interval, until stopped |
//! | `dir` | a `{dir: path}` header, then the sorted entry names |
//! | `pipe` | whatever is written to the named pipe |

use crate::engine::pipes::Pipe;
use crate::observability::messages::engine::DirectoryOperationFailed;
use crate::observability::messages::StructuredLog;
use crate::traits::{Source, SourceContext};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Emits a single event describing the run: its arguments and the process
/// environment.
pub struct InitSource;

#[async_trait]
impl Source for InitSource {
    async fn produce(&self, ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
        let vars: BTreeMap<String, Value> = std::env::vars()
            .map(|(key, value)| (key, Value::Str(value)))
            .collect();
        let mut event = BTreeMap::new();
        event.insert("args".to_string(), ctx.env.args().clone());
        event.insert("env".to_string(), Value::Map(vars));
        let _ = tx.send(Value::Map(event));
    }

    fn name(&self) -> &'static str {
        "init"
    }
}

/// Emits the current time in epoch milliseconds every interval.
///
/// The interval is the node config when it is an integer, the
/// `interval_ms` field when it is a map, otherwise the run's
/// `timer_interval_ms` option.
pub struct TimerSource;

impl TimerSource {
    fn interval(ctx: &SourceContext) -> Duration {
        let configured = match &ctx.config {
            Value::Map(_) => ctx.config.get("interval_ms").and_then(Value::as_i64),
            other => other.as_i64(),
        };
        match configured {
            Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
            _ => ctx.env.options().timer_interval(),
        }
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl Source for TimerSource {
    async fn produce(&self, ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
        let period = Self::interval(&ctx);
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let token = ctx.env.token().clone();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tx.closed() => break,
                _ = ticker.tick() => {
                    if tx.send(Value::Int(epoch_millis())).is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "timer"
    }
}

/// Lists a directory: a `{dir: path}` header followed by each entry name,
/// sorted.
///
/// The path is the node config, or the `path` field of a map config.
pub struct DirSource;

#[async_trait]
impl Source for DirSource {
    async fn produce(&self, ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
        let dir = match &ctx.config {
            Value::Str(path) => path.clone(),
            other => other
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or(".")
                .to_string(),
        };

        let mut header = BTreeMap::new();
        header.insert("dir".to_string(), Value::Str(dir.clone()));
        if tx.send(Value::Map(header)).is_err() {
            return;
        }

        let mut names = Vec::new();
        match tokio::fs::read_dir(&dir).await {
            Ok(mut entries) => loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                    Ok(None) => break,
                    Err(error) => {
                        DirectoryOperationFailed {
                            operation: "read",
                            path: &dir,
                            error: &error,
                        }
                        .log();
                        break;
                    }
                }
            },
            Err(error) => {
                DirectoryOperationFailed {
                    operation: "read",
                    path: &dir,
                    error: &error,
                }
                .log();
                return;
            }
        }

        names.sort();
        for name in names {
            if tx.send(Value::Str(name)).is_err() {
                return;
            }
        }
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}

/// Reads the named pipe given as config (a string, or the `name` field of a
/// map) and forwards every value.
///
/// The pipe is closed as soon as the reader goes away, whether the writer
/// finished, the consuming stream reduced, or the run was shut down; the
/// writer then starts dropping values.
pub struct PipeSource;

pub(crate) fn pipe_name(config: &Value) -> Option<&str> {
    match config {
        Value::Str(name) => Some(name.as_str()),
        other => other.get("name").and_then(Value::as_str),
    }
}

struct CloseOnDrop(Arc<Pipe>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

#[async_trait]
impl Source for PipeSource {
    async fn produce(&self, ctx: SourceContext, tx: mpsc::UnboundedSender<Value>) {
        let Some(name) = pipe_name(&ctx.config) else {
            tracing::warn!(path = %ctx.path, "pipe source has no pipe name, producing nothing");
            return;
        };
        let pipe = ctx.env.pipes().open(name);
        let Some(mut reader) = pipe.take_reader() else {
            return;
        };
        let _closer = CloseOnDrop(pipe);
        let token = ctx.env.token().clone();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tx.closed() => break,
                received = reader.recv() => match received {
                    Some(value) => {
                        if tx.send(value).is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    }

    fn name(&self) -> &'static str {
        "pipe"
    }
}

/// Stands in for an unknown source kind; produces nothing.
pub struct InertSource;

#[async_trait]
impl Source for InertSource {
    async fn produce(&self, _ctx: SourceContext, _tx: mpsc::UnboundedSender<Value>) {}

    fn name(&self) -> &'static str {
        "inert"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::engine::Environment;

    fn ctx(env: &Environment, config: Value) -> SourceContext {
        SourceContext {
            path: "src".to_string(),
            config,
            env: env.clone(),
        }
    }

    async fn drain(source: impl Source, ctx: SourceContext) -> Vec<Value> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        source.produce(ctx, tx).await;
        let mut out = Vec::new();
        while let Some(v) = rx.recv().await {
            out.push(v);
        }
        out
    }

    #[tokio::test]
    async fn test_init_emits_args_once() {
        let env = Environment::builder().args(vec![Value::from("x")]).build();
        let out = drain(InitSource, ctx(&env, Value::Null)).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("args"), Some(&Value::List(vec![Value::from("x")])));
        assert!(out[0].get("env").and_then(Value::as_map).is_some());
    }

    #[test]
    fn test_timer_interval_resolution() {
        let env = Environment::builder()
            .options(RunOptions {
                timer_interval_ms: 40,
            })
            .build();
        assert_eq!(
            TimerSource::interval(&ctx(&env, Value::Int(5))),
            Duration::from_millis(5)
        );
        let map = Value::from(serde_json::json!({"interval_ms": 7}));
        assert_eq!(
            TimerSource::interval(&ctx(&env, map)),
            Duration::from_millis(7)
        );
        assert_eq!(
            TimerSource::interval(&ctx(&env, Value::Null)),
            Duration::from_millis(40)
        );
    }

    #[tokio::test]
    async fn test_timer_stops_when_receiver_dropped() {
        let env = Environment::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            TimerSource.produce(ctx(&env, Value::Int(1)), tx).await;
        });
        let first = rx.recv().await.unwrap();
        assert!(first.as_i64().unwrap() > 0);
        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_timer_stops_on_shutdown() {
        let env = Environment::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let source_env = env.clone();
        let handle = tokio::spawn(async move {
            TimerSource.produce(ctx(&source_env, Value::Int(1)), tx).await;
        });
        env.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dir_lists_sorted_entries_after_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        let path = dir.path().to_string_lossy().into_owned();

        let out = drain(DirSource, ctx(&Environment::new(), Value::from(path.as_str()))).await;
        assert_eq!(out[0].get("dir"), Some(&Value::from(path.as_str())));
        assert_eq!(&out[1..], &[Value::from("a.txt"), Value::from("b.txt")]);
    }

    #[tokio::test]
    async fn test_dir_missing_directory_emits_only_header() {
        let out = drain(
            DirSource,
            ctx(&Environment::new(), Value::from("/definitely/not/here")),
        )
        .await;
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_pipe_source_forwards_until_writer_finishes() {
        let env = Environment::new();
        let writer = env.pipes().open("p").claim_writer().unwrap();
        writer.write(Value::Int(1));
        writer.write(Value::Int(2));
        writer.finish();

        let out = drain(PipeSource, ctx(&env, Value::from("p"))).await;
        assert_eq!(out, vec![Value::Int(1), Value::Int(2)]);
    }

    #[tokio::test]
    async fn test_inert_source_produces_nothing() {
        assert!(drain(InertSource, ctx(&Environment::new(), Value::Null))
            .await
            .is_empty());
    }
}
