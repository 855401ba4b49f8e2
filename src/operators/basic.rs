// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Value-by-value operators: mapping, filtering and running folds.

use crate::reducing::{Partial, Step, Transducer};
use crate::value::Value;
use std::sync::Arc;

/// Step `f(v)` for every input `v`.
pub fn map<F>(f: F) -> Transducer
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Transducer::new(move |down| {
        let f = f.clone();
        Partial::new().step(move |acc, v| down.step(acc, f(v)))
    })
}

/// Step every element of `f(v)` in order, stopping if the downstream reduces.
pub fn flat_map<F>(f: F) -> Transducer
where
    F: Fn(Value) -> Vec<Value> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Transducer::new(move |down| {
        let f = f.clone();
        Partial::new().step(move |mut acc, v| {
            for item in f(v) {
                match down.step(acc, item) {
                    Step::Continue(next) => acc = next,
                    reduced @ Step::Reduced(_) => return reduced,
                }
            }
            Step::Continue(acc)
        })
    })
}

/// Replace every input with `x`.
pub fn emit(x: impl Into<Value>) -> Transducer {
    let x = x.into();
    map(move |_| x.clone())
}

/// Step the running fold state after each input.
pub fn reductions<F>(f: F, init: impl Into<Value>) -> Transducer
where
    F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let init = init.into();
    Transducer::new(move |down| {
        let f = f.clone();
        let mut state = init.clone();
        Partial::new().step(move |acc, v| {
            state = f(&state, &v);
            down.step(acc, state.clone())
        })
    })
}

/// Step only the inputs for which `pred` holds.
pub fn filter<P>(pred: P) -> Transducer
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let pred = Arc::new(pred);
    Transducer::new(move |down| {
        let pred = pred.clone();
        Partial::new().step(move |acc, v| {
            if pred(&v) {
                down.step(acc, v)
            } else {
                Step::Continue(acc)
            }
        })
    })
}

/// Keep `v` when `pred(previous input, v)` holds. The first input is always kept.
pub fn filter2<P>(pred: P) -> Transducer
where
    P: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    let pred = Arc::new(pred);
    Transducer::new(move |down| {
        let pred = pred.clone();
        let mut prev: Option<Value> = None;
        Partial::new().step(move |acc, v| {
            let keep = prev.as_ref().map_or(true, |p| pred(p, &v));
            prev = Some(v.clone());
            if keep {
                down.step(acc, v)
            } else {
                Step::Continue(acc)
            }
        })
    })
}

/// Drop consecutive repeats.
pub fn dedupe() -> Transducer {
    filter2(|prev, v| prev != v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducing::sequence;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&i| Value::Int(i)).collect()
    }

    fn int(v: &Value) -> i64 {
        v.as_i64().unwrap_or_default()
    }

    #[test]
    fn test_map() {
        let xf = map(|v| Value::Int(int(&v) * 10));
        assert_eq!(sequence(&xf, ints(&[1, 2])), ints(&[10, 20]));
    }

    #[test]
    fn test_flat_map() {
        let xf = flat_map(|v| vec![v.clone(), v]);
        assert_eq!(sequence(&xf, ints(&[1, 2])), ints(&[1, 1, 2, 2]));
    }

    #[test]
    fn test_emit() {
        assert_eq!(sequence(&emit("x"), ints(&[1, 2])), vec![Value::from("x"); 2]);
    }

    #[test]
    fn test_reductions() {
        let xf = reductions(|a, b| Value::Int(int(a) + int(b)), 0);
        assert_eq!(sequence(&xf, ints(&[1, 2, 3])), ints(&[1, 3, 6]));
    }

    #[test]
    fn test_reductions_restart_per_application() {
        let xf = reductions(|a, b| Value::Int(int(a) + int(b)), 0);
        assert_eq!(sequence(&xf, ints(&[5])), ints(&[5]));
        assert_eq!(sequence(&xf, ints(&[5])), ints(&[5]));
    }

    #[test]
    fn test_filter() {
        let xf = filter(|v| int(v) % 2 == 0);
        assert_eq!(sequence(&xf, ints(&[1, 2, 3, 4])), ints(&[2, 4]));
    }

    #[test]
    fn test_filter2_compares_with_previous_input() {
        let rising = filter2(|prev, v| int(v) > int(prev));
        assert_eq!(sequence(&rising, ints(&[3, 1, 2, 5, 4])), ints(&[3, 2, 5]));
    }

    #[test]
    fn test_dedupe() {
        assert_eq!(sequence(&dedupe(), ints(&[1, 1, 2, 2, 1])), ints(&[1, 2, 1]));
    }
}
