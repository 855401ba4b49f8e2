// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Named in-process pipes between runs.
//!
//! A pipe is an unbounded channel with one writer claim and one reader claim.
//! The `pipe` sink claims the writer, the `pipe` source claims the reader and
//! forwards values into its own stream. When the reading side reduces, it
//! drops the receiver and marks the pipe closed; further writes are dropped
//! with a warning.
//!
//! Registries nest: a child registry sees the pipes of its parent but creates
//! new pipes only in itself.

use crate::observability::messages::engine::{PipeClaimRejected, PipeWriteDropped};
use crate::observability::messages::StructuredLog;
use crate::reducing::lock;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One named pipe.
pub struct Pipe {
    name: String,
    tx: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
    writer_claimed: AtomicBool,
    closed: AtomicBool,
}

impl Pipe {
    fn new(name: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name: name.to_string(),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            writer_claimed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the pipe closed; pending and future writes are dropped.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.tx).take();
    }

    /// Claim the single writer. A second claim is refused.
    pub fn claim_writer(self: &Arc<Self>) -> Option<PipeWriter> {
        if self.writer_claimed.swap(true, Ordering::SeqCst) {
            PipeClaimRejected {
                pipe: &self.name,
                side: "writer",
            }
            .log();
            return None;
        }
        Some(PipeWriter { pipe: self.clone() })
    }

    /// Take the receiving end. Only the first caller gets it.
    pub fn take_reader(&self) -> Option<mpsc::UnboundedReceiver<Value>> {
        let reader = lock(&self.rx).take();
        if reader.is_none() {
            PipeClaimRejected {
                pipe: &self.name,
                side: "reader",
            }
            .log();
        }
        reader
    }
}

/// The writing end of a [`Pipe`].
pub struct PipeWriter {
    pipe: Arc<Pipe>,
}

impl PipeWriter {
    pub fn write(&self, value: Value) {
        if self.pipe.is_closed() {
            PipeWriteDropped {
                pipe: &self.pipe.name,
                reason: "pipe is closed",
            }
            .log();
            return;
        }
        let sent = match lock(&self.pipe.tx).as_ref() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        };
        if !sent {
            self.pipe.closed.store(true, Ordering::SeqCst);
            PipeWriteDropped {
                pipe: &self.pipe.name,
                reason: "reader has stopped",
            }
            .log();
        }
    }

    /// End the stream for the reader.
    pub fn finish(&self) {
        lock(&self.pipe.tx).take();
    }
}

/// Pipes by name, with read-through to a parent registry.
#[derive(Clone, Default)]
pub struct PipeRegistry {
    pipes: Arc<Mutex<HashMap<String, Arc<Pipe>>>>,
    parent: Option<Box<PipeRegistry>>,
}

impl PipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that sees this one's pipes but keeps its own new pipes private.
    pub fn child(&self) -> Self {
        Self {
            pipes: Arc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Find an existing pipe here or in any ancestor.
    pub fn lookup(&self, name: &str) -> Option<Arc<Pipe>> {
        if let Some(pipe) = lock(&self.pipes).get(name) {
            return Some(pipe.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Find a pipe, creating it in this registry when no ancestor has it.
    pub fn open(&self, name: &str) -> Arc<Pipe> {
        if let Some(parent) = &self.parent {
            if let Some(pipe) = parent.lookup(name) {
                return pipe;
            }
        }
        lock(&self.pipes)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Pipe::new(name)))
            .clone()
    }
}
