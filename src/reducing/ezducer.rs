// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::reducing::protocol::{lock, Downstream, Partial, Step, Transducer};
use crate::value::Value;
use std::sync::{Arc, Mutex};

/// One output of an [`Ez`] step.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    Value(Value),
    /// Stop the stream after the values emitted so far.
    Reduce,
}

impl From<Value> for Emit {
    fn from(v: Value) -> Self {
        Emit::Value(v)
    }
}

/// Per-stream state of an operator written as "values in, values out".
pub trait Ez: Send {
    fn step(&mut self, value: Value) -> Vec<Emit>;

    /// Trailing values emitted when the input ends.
    fn result(&mut self) -> Vec<Value> {
        Vec::new()
    }
}

struct EzState<S> {
    inner: S,
    stopped: bool,
    halted: bool,
}

/// Build an operator from fresh [`Ez`] state per application.
///
/// Each emitted value is folded through the downstream individually. Once the
/// downstream reduces, trailing values from [`Ez::result`] are skipped.
pub fn ezducer<S, B>(build: B) -> Transducer
where
    S: Ez + 'static,
    B: Fn() -> S + Send + Sync + 'static,
{
    Transducer::new(move |down: Downstream| {
        let state = Arc::new(Mutex::new(EzState {
            inner: build(),
            stopped: false,
            halted: false,
        }));
        let step_state = state.clone();
        let step_down = down.clone();

        Partial::new()
            .step(move |mut acc, value| {
                let mut st = lock(&step_state);
                if st.stopped {
                    return Step::Reduced(acc);
                }
                for emit in st.inner.step(value) {
                    match emit {
                        Emit::Value(out) => match step_down.step(acc, out) {
                            Step::Continue(next) => acc = next,
                            Step::Reduced(last) => {
                                st.stopped = true;
                                st.halted = true;
                                return Step::Reduced(last);
                            }
                        },
                        Emit::Reduce => {
                            st.stopped = true;
                            return Step::Reduced(acc);
                        }
                    }
                }
                Step::Continue(acc)
            })
            .result(move |mut acc| {
                let trailing = {
                    let mut st = lock(&state);
                    if st.halted {
                        Vec::new()
                    } else {
                        st.inner.result()
                    }
                };
                for out in trailing {
                    match down.step(acc, out) {
                        Step::Continue(next) => acc = next,
                        Step::Reduced(last) => {
                            acc = last;
                            break;
                        }
                    }
                }
                down.result(acc)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducing::protocol::sequence;

    struct Pairs {
        pending: Option<Value>,
    }

    impl Ez for Pairs {
        fn step(&mut self, value: Value) -> Vec<Emit> {
            match self.pending.take() {
                Some(first) => vec![Emit::Value(Value::List(vec![first, value]))],
                None => {
                    self.pending = Some(value);
                    Vec::new()
                }
            }
        }

        fn result(&mut self) -> Vec<Value> {
            self.pending.take().into_iter().collect()
        }
    }

    struct UntilNegative;

    impl Ez for UntilNegative {
        fn step(&mut self, value: Value) -> Vec<Emit> {
            if value.as_i64().unwrap_or(0) < 0 {
                vec![Emit::Reduce]
            } else {
                vec![Emit::Value(value.clone()), Emit::Value(value)]
            }
        }
    }

    #[test]
    fn test_ezducer_emits_many_and_trailing() {
        let xf = ezducer(|| Pairs { pending: None });
        let out = sequence(&xf, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            out,
            vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::Int(3),
            ]
        );
    }

    #[test]
    fn test_ezducer_reduce_sentinel_stops_stream() {
        let xf = ezducer(|| UntilNegative);
        let out = sequence(&xf, vec![Value::Int(1), Value::Int(-1), Value::Int(2)]);
        assert_eq!(out, vec![Value::Int(1), Value::Int(1)]);
    }

    #[test]
    fn test_ezducer_state_is_fresh_per_application() {
        let xf = ezducer(|| Pairs { pending: None });
        assert_eq!(sequence(&xf, vec![Value::Int(1)]), vec![Value::Int(1)]);
        assert_eq!(sequence(&xf, vec![Value::Int(2)]), vec![Value::Int(2)]);
    }
}
