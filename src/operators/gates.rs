// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operators that open or close the stream based on position or predicate.

use crate::reducing::{reduced, Partial, Step, Transducer};
use crate::value::Value;
use std::sync::Arc;

/// Consume every input and produce nothing.
pub fn drop_all() -> Transducer {
    Transducer::new(|_| Partial::new().step(|acc, _| Step::Continue(acc)))
}

/// Step the first `n` inputs, then reduce. `n < 1` behaves like [`drop_all`].
pub fn take(n: i64) -> Transducer {
    if n < 1 {
        return drop_all();
    }
    Transducer::new(move |down| {
        let mut taken = 0;
        Partial::new().step(move |acc, v| {
            taken += 1;
            let out = down.step(acc, v);
            if taken >= n {
                reduced(out)
            } else {
                out
            }
        })
    })
}

/// Step inputs while `pred` holds; the first failing input reduces without being stepped.
pub fn take_while<P>(pred: P) -> Transducer
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
                Step::Reduced(acc)
            }
        })
    })
}

/// Skip the first `n` inputs.
pub fn drop(n: i64) -> Transducer {
    Transducer::new(move |down| {
        let mut skipped = 0;
        Partial::new().step(move |acc, v| {
            if skipped < n {
                skipped += 1;
                Step::Continue(acc)
            } else {
                down.step(acc, v)
            }
        })
    })
}

/// Skip inputs while `pred` holds, then pass everything through.
pub fn drop_while<P>(pred: P) -> Transducer
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let pred = Arc::new(pred);
    Transducer::new(move |down| {
        let pred = pred.clone();
        let mut dropping = true;
        Partial::new().step(move |acc, v| {
            if dropping && pred(&v) {
                return Step::Continue(acc);
            }
            dropping = false;
            down.step(acc, v)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducing::sequence;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&i| Value::Int(i)).collect()
    }

    #[test]
    fn test_take() {
        assert_eq!(sequence(&take(2), ints(&[1, 2, 3])), ints(&[1, 2]));
        assert_eq!(sequence(&take(5), ints(&[1, 2, 3])), ints(&[1, 2, 3]));
    }

    #[test]
    fn test_take_non_positive_takes_nothing() {
        assert!(sequence(&take(0), ints(&[1, 2, 3])).is_empty());
        assert!(sequence(&take(-4), ints(&[1, 2, 3])).is_empty());
    }

    #[test]
    fn test_take_while() {
        let xf = take_while(|v| v.as_i64().unwrap_or(0) < 3);
        assert_eq!(sequence(&xf, ints(&[1, 2, 3, 1])), ints(&[1, 2]));
    }

    #[test]
    fn test_drop() {
        assert_eq!(sequence(&drop(2), ints(&[1, 2, 3])), ints(&[3]));
        assert_eq!(sequence(&drop(0), ints(&[1, 2])), ints(&[1, 2]));
    }

    #[test]
    fn test_drop_while() {
        let xf = drop_while(|v| v.as_i64().unwrap_or(0) < 3);
        assert_eq!(sequence(&xf, ints(&[1, 3, 1, 4])), ints(&[3, 1, 4]));
    }

    #[test]
    fn test_drop_all() {
        assert!(sequence(&drop_all(), ints(&[1, 2])).is_empty());
    }
}
