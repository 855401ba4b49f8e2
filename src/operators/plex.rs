// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-out and fan-in over one downstream.
//!
//! [`multiplex`] feeds each input to several branch operators that all write
//! into the same downstream. Branches see a shielded view of it: their
//! `result` does not finalize the real downstream, which is finalized once by
//! the multiplexer itself.
//!
//! [`demultiplex`] is the inverse bookkeeping: several producers each hold
//! their own transformer, but all of them step one shared downstream, which is
//! finalized only after every producer has called `result`. Producers may keep
//! stepping while others have already finished; the count is all that matters.

use crate::reducing::{lock, Downstream, Partial, Step, Transducer, Transformer};
use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// A view of `down` whose `result` is the identity.
///
/// `halted` is raised when `down` itself reduces.
fn shield(down: Downstream, halted: Arc<AtomicBool>) -> Transformer {
    let init_down = down.clone();
    Transformer::new(
        move || init_down.init(),
        move |acc, v| {
            let out = down.step(acc, v);
            if out.is_reduced() {
                halted.store(true, Ordering::SeqCst);
            }
            out
        },
        |acc| acc,
    )
}

/// Feed every input to each of `xfs` over one shared downstream.
///
/// A branch that reduces is finalized and removed. Once every branch is
/// removed, or the downstream itself reduces, the multiplexer reduces.
pub fn multiplex(xfs: impl IntoIterator<Item = Transducer>) -> Transducer {
    let mut xfs: Vec<Transducer> = xfs.into_iter().collect();
    if xfs.len() < 2 {
        return xfs.pop().unwrap_or_else(Transducer::identity);
    }
    let xfs = Arc::new(xfs);

    Transducer::new(move |down| {
        let halted = Arc::new(AtomicBool::new(false));
        let branches: Vec<Option<Transformer>> = xfs
            .iter()
            .map(|xf| Some(xf.apply(shield(down.clone(), halted.clone()))))
            .collect();
        let branches = Arc::new(Mutex::new(branches));
        let step_branches = branches.clone();

        Partial::new()
            .step(move |mut acc, v| {
                let mut active = lock(&step_branches);
                for slot in active.iter_mut() {
                    let Some(branch) = slot.as_mut() else {
                        continue;
                    };
                    match branch.step(acc, v.clone()) {
                        Step::Continue(next) => acc = next,
                        Step::Reduced(last) => {
                            acc = branch.result(last);
                            *slot = None;
                        }
                    }
                    if halted.load(Ordering::SeqCst) {
                        break;
                    }
                }
                if halted.load(Ordering::SeqCst) {
                    for mut branch in active.iter_mut().filter_map(Option::take) {
                        acc = branch.result(acc);
                    }
                    return Step::Reduced(acc);
                }
                if active.iter().all(Option::is_none) {
                    Step::Reduced(acc)
                } else {
                    Step::Continue(acc)
                }
            })
            .result(move |mut acc| {
                let remaining: Vec<Transformer> =
                    lock(&branches).iter_mut().filter_map(Option::take).collect();
                for mut branch in remaining {
                    acc = branch.result(acc);
                }
                down.result(acc)
            })
    })
}

struct Demux {
    down: Transformer,
    expected: usize,
    finished: usize,
    reduced: bool,
}

impl Demux {
    fn is_finalized(&self) -> bool {
        self.finished >= self.expected
    }

    fn step(&mut self, acc: Value, v: Value) -> Step {
        if self.reduced {
            return Step::Reduced(acc);
        }
        let out = self.down.step(acc, v);
        if out.is_reduced() {
            self.reduced = true;
        }
        out
    }

    fn finish(&mut self, acc: Value) -> Value {
        self.finished += 1;
        if self.finished == self.expected {
            self.down.result(acc)
        } else {
            acc
        }
    }
}

/// `n` producers sharing `xf` applied once to one downstream.
///
/// The first application builds the shared state from its own downstream;
/// later applications join that state until it has been finalized, after
/// which the next application starts a fresh one. The downstream's `result`
/// runs after exactly `n` `result` calls across all producers.
pub fn shared(n: usize, xf: Transducer) -> Transducer {
    let expected = n.max(1);
    let live: Arc<Mutex<Weak<Mutex<Demux>>>> = Arc::new(Mutex::new(Weak::new()));

    Transducer::from_fn(move |rf| {
        let demux = {
            let mut slot = lock(&live);
            match slot.upgrade() {
                Some(current) if !lock(&current).is_finalized() => current,
                _ => {
                    let fresh = Arc::new(Mutex::new(Demux {
                        down: xf.apply(rf),
                        expected,
                        finished: 0,
                        reduced: false,
                    }));
                    *slot = Arc::downgrade(&fresh);
                    fresh
                }
            }
        };

        let (init_demux, step_demux) = (demux.clone(), demux.clone());
        Transformer::new(
            move || lock(&init_demux).down.init(),
            move |acc, v| lock(&step_demux).step(acc, v),
            move |acc| lock(&demux).finish(acc),
        )
    })
}

/// `n` producers feeding one downstream, finalized after `n` results.
pub fn demultiplex(n: usize) -> Transducer {
    shared(n, Transducer::identity())
}
