// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::reducing::{Partial, Step, Transducer};
use crate::value::Value;
use std::collections::VecDeque;

/// Sliding windows of `width` inputs, emitted every `stride` inputs once full.
///
/// `width < 0` is treated as 0 and `stride < 1` as 1. A window that never
/// fills before the input ends is dropped.
pub fn partition(width: i64, stride: i64) -> Transducer {
    let width = width.max(0) as usize;
    let stride = stride.max(1) as usize;
    Transducer::new(move |down| {
        let mut window: VecDeque<Value> = VecDeque::with_capacity(width);
        let mut seen = 0usize;
        Partial::new().step(move |acc, v| {
            seen += 1;
            if width > 0 {
                if window.len() == width {
                    window.pop_front();
                }
                window.push_back(v);
            }
            if seen < width || (seen - width) % stride != 0 {
                return Step::Continue(acc);
            }
            down.step(acc, Value::List(window.iter().cloned().collect()))
        })
    })
}

/// Step the window of the last `n` inputs, current one included.
pub fn trailing(n: i64) -> Transducer {
    let n = n.max(0) as usize;
    Transducer::new(move |down| {
        let mut window: VecDeque<Value> = VecDeque::with_capacity(n);
        Partial::new().step(move |acc, v| {
            if n > 0 {
                if window.len() == n {
                    window.pop_front();
                }
                window.push_back(v);
            }
            down.step(acc, Value::List(window.iter().cloned().collect()))
        })
    })
}
