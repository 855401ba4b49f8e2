// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operators that add values around a stream and the tagging convention
//! built on them.
//!
//! A tagged stream carries `[k, v]` pairs and ends with the sentinel `[k]`,
//! which lets several logical streams share one physical sequence.

use crate::operators::basic::map;
use crate::operators::gates::drop_all;
use crate::reducing::{Partial, Step, Transducer};
use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Step `x` before the first input, or at completion if there was none.
///
/// Nothing is forced once the downstream has reduced.
pub fn prolog(x: impl Into<Value>) -> Transducer {
    let x = x.into();
    Transducer::new(move |down| {
        let started = Arc::new(AtomicBool::new(false));
        let halted = Arc::new(AtomicBool::new(false));
        let (step_started, step_halted, step_down, first) =
            (started.clone(), halted.clone(), down.clone(), x.clone());
        let last = x.clone();

        Partial::new()
            .step(move |acc, v| {
                let mut acc = acc;
                if !step_started.swap(true, Ordering::SeqCst) {
                    match step_down.step(acc, first.clone()) {
                        Step::Continue(next) => acc = next,
                        reduced @ Step::Reduced(_) => {
                            step_halted.store(true, Ordering::SeqCst);
                            return reduced;
                        }
                    }
                }
                let out = step_down.step(acc, v);
                if out.is_reduced() {
                    step_halted.store(true, Ordering::SeqCst);
                }
                out
            })
            .result(move |acc| {
                let acc = if !started.swap(true, Ordering::SeqCst) && !halted.load(Ordering::SeqCst)
                {
                    down.step(acc, last.clone()).into_value()
                } else {
                    acc
                };
                down.result(acc)
            })
    })
}

/// Step `x` after the last input, even when the input was empty.
///
/// Nothing is forced once the downstream has reduced.
pub fn epilog(x: impl Into<Value>) -> Transducer {
    let x = x.into();
    Transducer::new(move |down| {
        let halted = Arc::new(AtomicBool::new(false));
        let (step_halted, step_down) = (halted.clone(), down.clone());
        let last = x.clone();

        Partial::new()
            .step(move |acc, v| {
                let out = step_down.step(acc, v);
                if out.is_reduced() {
                    step_halted.store(true, Ordering::SeqCst);
                }
                out
            })
            .result(move |acc| {
                let acc = if halted.load(Ordering::SeqCst) {
                    acc
                } else {
                    down.step(acc, last.clone()).into_value()
                };
                down.result(acc)
            })
    })
}

/// Swallow the input and step `x` once it ends.
pub fn after(x: impl Into<Value>) -> Transducer {
    drop_all().then(epilog(x))
}

/// Wrap every input as `[k, v]` and end the stream with `[k]`.
pub fn tag(k: impl Into<Value>) -> Transducer {
    let k = k.into();
    let key = k.clone();
    map(move |v| Value::tagged(key.clone(), v)).then(epilog(Value::sentinel(k)))
}

/// Keep only `[k, v]` pairs, stepping `v`; the sentinel `[k]` reduces.
pub fn detag(k: impl Into<Value>) -> Transducer {
    let k = k.into();
    Transducer::new(move |down| {
        let key = k.clone();
        Partial::new().step(move |acc, v| match v.as_list() {
            Some([name, inner]) if *name == key => down.step(acc, inner.clone()),
            Some([name]) if *name == key => Step::Reduced(acc),
            _ => Step::Continue(acc),
        })
    })
}
