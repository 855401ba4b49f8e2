// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The collaborators a run can reach.
//!
//! An [`Environment`] maps source and sink kinds to implementations and owns
//! the named-pipe registry, the run arguments, the run options and the
//! cancellation token. Child environments, created for nested runs, shadow
//! their parent: lookups that miss locally fall back to the parent, and
//! nothing registered in a child is visible upward.

use crate::config::RunOptions;
use crate::engine::pipes::PipeRegistry;
use crate::engine::sinks::{DebugSink, DirSink, LogSink, PipeSink, RunSink};
use crate::engine::sources::{DirSource, InitSource, PipeSource, TimerSource};
use crate::reducing::lock;
use crate::traits::{Sink, Source};
use crate::value::Value;
use std::collections::HashMap;
use std::future::Future;
use std::mem;
use std::panic;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

struct Scope {
    sources: HashMap<String, Arc<dyn Source>>,
    sinks: HashMap<String, Arc<dyn Sink>>,
    pipes: PipeRegistry,
    args: Value,
    options: RunOptions,
    token: CancellationToken,
    nested: Mutex<JoinSet<()>>,
    parent: Option<Environment>,
}

/// A cheaply clonable handle to a run scope.
#[derive(Clone)]
pub struct Environment(Arc<Scope>);

impl Environment {
    /// A builder preloaded with the built-in sources and sinks.
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn source(&self, kind: &str) -> Option<Arc<dyn Source>> {
        match self.0.sources.get(kind) {
            Some(source) => Some(source.clone()),
            None => self.0.parent.as_ref().and_then(|p| p.source(kind)),
        }
    }

    pub fn sink(&self, kind: &str) -> Option<Arc<dyn Sink>> {
        match self.0.sinks.get(kind) {
            Some(sink) => Some(sink.clone()),
            None => self.0.parent.as_ref().and_then(|p| p.sink(kind)),
        }
    }

    pub fn pipes(&self) -> &PipeRegistry {
        &self.0.pipes
    }

    /// Arguments the run was started with; `Null` falls back to the parent's.
    pub fn args(&self) -> &Value {
        match (&self.0.args, &self.0.parent) {
            (Value::Null, Some(parent)) => parent.args(),
            (args, _) => args,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.0.options
    }

    pub fn token(&self) -> &CancellationToken {
        &self.0.token
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// A scope for a nested run: no local registrations, a child pipe
    /// registry and a child cancellation token.
    pub fn child(&self, args: impl Into<Value>) -> Environment {
        Environment(Arc::new(Scope {
            sources: HashMap::new(),
            sinks: HashMap::new(),
            pipes: self.0.pipes.child(),
            args: args.into(),
            options: self.0.options.clone(),
            token: self.0.token.child_token(),
            nested: Mutex::new(JoinSet::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Stop every source of this scope and of the scopes nested in it.
    pub fn shutdown(&self) {
        self.0.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.token.is_cancelled()
    }

    /// Track a nested run so that the owning run waits for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_nested<F>(&self, run: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        lock(&self.0.nested).spawn(run);
    }

    /// Wait for every nested run spawned so far, including the ones spawned
    /// while waiting. A panic in a nested run is re-raised here.
    pub async fn join_nested(&self) {
        loop {
            let mut pending = mem::take(&mut *lock(&self.0.nested));
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(err) = joined {
                    if err.is_panic() {
                        pending.abort_all();
                        panic::resume_unwind(err.into_panic());
                    }
                }
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers collaborators before a run.
///
/// ```
/// use dagstream::engine::Environment;
///
/// let env = Environment::builder()
///     .args(vec![dagstream::value::Value::from("--verbose")])
///     .build();
/// assert!(env.source("timer").is_some());
/// assert!(env.sink("log").is_some());
/// ```
pub struct EnvironmentBuilder {
    sources: HashMap<String, Arc<dyn Source>>,
    sinks: HashMap<String, Arc<dyn Sink>>,
    args: Value,
    options: RunOptions,
}

impl EnvironmentBuilder {
    fn new() -> Self {
        Self {
            sources: HashMap::new(),
            sinks: HashMap::new(),
            args: Value::Null,
            options: RunOptions::default(),
        }
        .source(InitSource)
        .source(TimerSource)
        .source(DirSource)
        .source(PipeSource)
        .sink(LogSink)
        .sink(DebugSink)
        .sink(DirSink)
        .sink(PipeSink)
        .sink(RunSink)
    }

    /// Register `source` under its own name, replacing any previous one.
    pub fn source(self, source: impl Source + 'static) -> Self {
        let name = source.name();
        self.source_as(name, source)
    }

    /// Register `source` under an explicit kind.
    pub fn source_as(mut self, kind: &str, source: impl Source + 'static) -> Self {
        self.sources.insert(kind.to_string(), Arc::new(source));
        self
    }

    pub fn sink(self, sink: impl Sink + 'static) -> Self {
        let name = sink.name();
        self.sink_as(name, sink)
    }

    pub fn sink_as(mut self, kind: &str, sink: impl Sink + 'static) -> Self {
        self.sinks.insert(kind.to_string(), Arc::new(sink));
        self
    }

    pub fn args(mut self, args: impl Into<Value>) -> Self {
        self.args = args.into();
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Environment {
        Environment(Arc::new(Scope {
            sources: self.sources,
            sinks: self.sinks,
            pipes: PipeRegistry::new(),
            args: self.args,
            options: self.options,
            token: CancellationToken::new(),
            nested: Mutex::new(JoinSet::new()),
            parent: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SourceContext;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct Quiet;

    #[async_trait]
    impl Source for Quiet {
        async fn produce(&self, _ctx: SourceContext, _tx: mpsc::UnboundedSender<Value>) {}

        fn name(&self) -> &'static str {
            "quiet"
        }
    }

    #[test]
    fn test_builtins_are_registered() {
        let env = Environment::new();
        for kind in ["init", "timer", "dir", "pipe"] {
            assert!(env.source(kind).is_some(), "missing source {}", kind);
        }
        for kind in ["log", "debug", "dir", "pipe", "run"] {
            assert!(env.sink(kind).is_some(), "missing sink {}", kind);
        }
        assert!(env.source("quiet").is_none());
    }

    #[test]
    fn test_custom_source_by_name_and_alias() {
        let env = Environment::builder()
            .source(Quiet)
            .source_as("silent", Quiet)
            .build();
        assert!(env.source("quiet").is_some());
        assert!(env.source("silent").is_some());
    }

    #[test]
    fn test_child_falls_back_to_parent() {
        let parent = Environment::builder()
            .source(Quiet)
            .args(Value::from("outer"))
            .build();
        let child = parent.child(Value::Null);

        assert!(child.source("quiet").is_some());
        assert_eq!(child.args(), &Value::from("outer"));
        assert!(child.parent().is_some());

        let shadowing = parent.child(Value::from("inner"));
        assert_eq!(shadowing.args(), &Value::from("inner"));
        assert_eq!(parent.args(), &Value::from("outer"));
    }

    #[test]
    fn test_shutdown_reaches_children() {
        let parent = Environment::new();
        let child = parent.child(Value::Null);
        parent.shutdown();
        assert!(parent.is_shutdown());
        assert!(child.is_shutdown());
    }

    #[tokio::test]
    async fn test_join_nested_waits_for_late_spawns() {
        let env = Environment::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let inner_env = env.clone();
        env.spawn_nested(async move {
            let tx2 = tx.clone();
            inner_env.spawn_nested(async move {
                let _ = tx2.send(2);
            });
            let _ = tx.send(1);
        });
        env.join_nested().await;

        let mut seen = Vec::new();
        while let Ok(v) = rx.try_recv() {
            seen.push(v);
        }
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
    }
}
