// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Init/Step/Result operator contract.
//!
//! A [`Transformer`] consumes a stream: `init` produces the starting
//! accumulator, `step` folds one value into it and `result` finishes it.
//! `step` answers with a [`Step`]; [`Step::Reduced`] asks the caller to stop
//! feeding values and go straight to `result`.
//!
//! A [`Transducer`] turns a downstream transformer into a new one. Its build
//! function receives a cloneable [`Downstream`] handle and returns a
//! [`Partial`]; every operation left unset falls back to the downstream's
//! operation of the same name. A build that sets nothing leaves the
//! downstream unwrapped.

use crate::value::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Acquire a lock, recovering the data of a poisoned mutex.
///
/// A panic inside user operator logic already aborts the run; recovering here
/// keeps the remaining bookkeeping (results, pipe closing) usable.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The answer to a `step`: keep going, or stop early.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue(Value),
    Reduced(Value),
}

impl Step {
    pub fn is_reduced(&self) -> bool {
        matches!(self, Step::Reduced(_))
    }

    /// The accumulator, with any early-termination marker removed.
    pub fn into_value(self) -> Value {
        match self {
            Step::Continue(v) | Step::Reduced(v) => v,
        }
    }
}

impl From<Value> for Step {
    fn from(v: Value) -> Self {
        Step::Continue(v)
    }
}

/// Mark an accumulator as final. Already reduced accumulators stay reduced.
pub fn reduced(x: impl Into<Step>) -> Step {
    Step::Reduced(x.into().into_value())
}

/// Remove the early-termination marker, if any.
pub fn unreduced(step: Step) -> Value {
    step.into_value()
}

pub fn is_reduced(step: &Step) -> bool {
    step.is_reduced()
}

pub type InitFn = Box<dyn FnMut() -> Value + Send>;
pub type StepFn = Box<dyn FnMut(Value, Value) -> Step + Send>;
pub type ResultFn = Box<dyn FnMut(Value) -> Value + Send>;

/// A stream consumer made of three operations.
pub struct Transformer {
    init: InitFn,
    step: StepFn,
    result: ResultFn,
}

impl Transformer {
    pub fn new(
        init: impl FnMut() -> Value + Send + 'static,
        step: impl FnMut(Value, Value) -> Step + Send + 'static,
        result: impl FnMut(Value) -> Value + Send + 'static,
    ) -> Self {
        Self {
            init: Box::new(init),
            step: Box::new(step),
            result: Box::new(result),
        }
    }

    /// A sink that accepts everything and keeps its accumulator unchanged.
    pub fn terminal() -> Self {
        Self::new(|| Value::Null, |acc, _| Step::Continue(acc), |acc| acc)
    }

    pub fn init(&mut self) -> Value {
        (self.init)()
    }

    pub fn step(&mut self, acc: Value, value: Value) -> Step {
        (self.step)(acc, value)
    }

    pub fn result(&mut self, acc: Value) -> Value {
        (self.result)(acc)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer").finish_non_exhaustive()
    }
}

/// Collects every stepped value into a [`Value::List`].
pub fn collector() -> Transformer {
    Transformer::new(
        || Value::List(Vec::new()),
        |acc, value| match acc {
            Value::List(mut items) => {
                items.push(value);
                Step::Continue(Value::List(items))
            }
            Value::Null => Step::Continue(Value::List(vec![value])),
            other => Step::Continue(Value::List(vec![other, value])),
        },
        |acc| acc,
    )
}

/// A shared handle to the transformer an operator feeds.
#[derive(Clone)]
pub struct Downstream(Arc<Mutex<Transformer>>);

impl Downstream {
    pub fn new(rf: Transformer) -> Self {
        Self(Arc::new(Mutex::new(rf)))
    }

    pub fn init(&self) -> Value {
        lock(&self.0).init()
    }

    pub fn step(&self, acc: Value, value: Value) -> Step {
        lock(&self.0).step(acc, value)
    }

    pub fn result(&self, acc: Value) -> Value {
        lock(&self.0).result(acc)
    }

    /// Recover the transformer when this is the last handle, else forward to it.
    fn into_transformer(self) -> Transformer {
        match Arc::try_unwrap(self.0) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                let (a, b, c) = (
                    Downstream(shared.clone()),
                    Downstream(shared.clone()),
                    Downstream(shared),
                );
                Transformer::new(
                    move || a.init(),
                    move |acc, v| b.step(acc, v),
                    move |acc| c.result(acc),
                )
            }
        }
    }
}

/// The operations an operator overrides; the rest come from downstream.
#[derive(Default)]
pub struct Partial {
    init: Option<InitFn>,
    step: Option<StepFn>,
    result: Option<ResultFn>,
}

impl Partial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(mut self, f: impl FnMut() -> Value + Send + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn step(mut self, f: impl FnMut(Value, Value) -> Step + Send + 'static) -> Self {
        self.step = Some(Box::new(f));
        self
    }

    pub fn result(mut self, f: impl FnMut(Value) -> Value + Send + 'static) -> Self {
        self.result = Some(Box::new(f));
        self
    }

    fn is_empty(&self) -> bool {
        self.init.is_none() && self.step.is_none() && self.result.is_none()
    }

    fn complete(self, down: Downstream) -> Transformer {
        if self.is_empty() {
            return down.into_transformer();
        }
        let Partial { init, step, result } = self;
        Transformer {
            init: init.unwrap_or_else(|| {
                let d = down.clone();
                Box::new(move || d.init())
            }),
            step: step.unwrap_or_else(|| {
                let d = down.clone();
                Box::new(move |acc, v| d.step(acc, v))
            }),
            result: result.unwrap_or_else(|| {
                let d = down.clone();
                Box::new(move |acc| d.result(acc))
            }),
        }
    }
}

type ApplyFn = dyn Fn(Transformer) -> Transformer + Send + Sync;

/// A reusable recipe turning a downstream transformer into a new one.
#[derive(Clone)]
pub struct Transducer {
    apply: Arc<ApplyFn>,
    identity: bool,
}

impl Transducer {
    /// Build an operator from a function of its downstream.
    pub fn new<B>(build: B) -> Self
    where
        B: Fn(Downstream) -> Partial + Send + Sync + 'static,
    {
        Self::from_fn(move |rf| {
            let down = Downstream::new(rf);
            build(down.clone()).complete(down)
        })
    }

    /// Build an operator that rewrites whole transformers.
    pub fn from_fn(f: impl Fn(Transformer) -> Transformer + Send + Sync + 'static) -> Self {
        Self {
            apply: Arc::new(f),
            identity: false,
        }
    }

    /// The operator that passes everything through untouched.
    pub fn identity() -> Self {
        Self {
            apply: Arc::new(|rf| rf),
            identity: true,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn apply(&self, rf: Transformer) -> Transformer {
        (self.apply)(rf)
    }

    /// Feed this operator's output into `next`.
    pub fn then(&self, next: Transducer) -> Transducer {
        if self.identity {
            return next;
        }
        if next.identity {
            return self.clone();
        }
        let first = self.clone();
        Self::from_fn(move |rf| first.apply(next.apply(rf)))
    }

    /// Chain operators left to right.
    pub fn compose(xfs: impl IntoIterator<Item = Transducer>) -> Transducer {
        xfs.into_iter()
            .fold(Transducer::identity(), |acc, xf| acc.then(xf))
    }
}

impl fmt::Debug for Transducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transducer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Fold `values` through `rf`, stopping at the first reduced accumulator.
pub fn transduce(mut rf: Transformer, init: Value, values: impl IntoIterator<Item = Value>) -> Value {
    let mut acc = init;
    for value in values {
        match rf.step(acc, value) {
            Step::Continue(next) => acc = next,
            Step::Reduced(last) => {
                acc = last;
                break;
            }
        }
    }
    rf.result(acc)
}

/// Run `values` through `xf` into a [`collector`] and return the output list.
pub fn sequence(xf: &Transducer, values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut rf = xf.apply(collector());
    let init = rf.init();
    match transduce(rf, init, values) {
        Value::List(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
