// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topological traversal of a [`Graph`], including the graphs nested in it.
//!
//! # Algorithm
//!
//! 1. **Flatten**: every non-alias leaf is indexed under its full path, and the
//!    edges recorded at each nesting level are merged into one adjacency map
//!    keyed by full path.
//! 2. **Roots**: nodes with no neighbour in the root direction, discovered in
//!    node-name order. A subgraph node is searched for roots only when the
//!    outer edge map has no entry for it.
//! 3. **Pre-pass**: depth-first search with an explicit stack and an
//!    `on_stack` set. Reaching a path that is still on the stack is a cycle;
//!    the error carries the chain from that path back to itself.
//! 4. **Post-order visit**: each path is visited once, after all of its
//!    children, and its result is memoized for every other parent.
//!
//! The only ordering guarantee is that children are visited before parents
//! along the chosen [`Direction`].

use crate::errors::CycleError;
use crate::graph::builder::Graph;
use crate::graph::node::NodeValue;
use crate::graph::path::Path;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Which edge map supplies children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Roots are nodes without inputs; children follow `outputs`.
    Forward,
    /// Roots are nodes without outputs; children follow `inputs`.
    Backward,
}

/// Per-path metadata handed to the visitor.
#[derive(Debug, Clone)]
pub struct WalkContext<'a> {
    pub path: Path,
    /// The graph that directly contains the node
    pub graph: &'a Graph,
    pub is_root: bool,
    pub is_leaf: bool,
    /// Neighbours in the root direction
    pub parents: Vec<Path>,
    /// Neighbours in the child direction
    pub children: Vec<Path>,
}

impl WalkContext<'_> {
    /// The path rendered with dots, used for naming streams.
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}

type Adjacency = BTreeMap<Path, BTreeSet<Path>>;

struct Flattened<'a> {
    index: HashMap<Path, (&'a Graph, &'a NodeValue)>,
    order: Vec<Path>,
    forward: Adjacency,
    backward: Adjacency,
}

impl<'a> Flattened<'a> {
    fn new(g: &'a Graph) -> Self {
        let mut flat = Flattened {
            index: HashMap::new(),
            order: Vec::new(),
            forward: Adjacency::new(),
            backward: Adjacency::new(),
        };
        flat.absorb(g, &[]);
        flat
    }

    fn absorb(&mut self, g: &'a Graph, prefix: &[String]) {
        for (from, tos) in g.outputs() {
            for to in tos {
                let from = prefixed(prefix, from);
                let to = prefixed(prefix, to);
                self.forward
                    .entry(from.clone())
                    .or_default()
                    .insert(to.clone());
                self.backward.entry(to).or_default().insert(from);
            }
        }

        for (name, node) in g.nodes() {
            let path = prefixed(prefix, std::slice::from_ref(name));
            match node {
                NodeValue::Alias(_) => {}
                NodeValue::Subgraph(sub) => self.absorb(sub, &path),
                NodeValue::Leaf(_) => {
                    self.index.insert(path.clone(), (g, node));
                    self.order.push(path);
                }
            }
        }
    }

    fn edges(&self, direction: Direction) -> (&Adjacency, &Adjacency) {
        match direction {
            Direction::Forward => (&self.forward, &self.backward),
            Direction::Backward => (&self.backward, &self.forward),
        }
    }

    fn roots(&self, g: &'a Graph, prefix: &[String], upward: &Adjacency, roots: &mut Vec<Path>) {
        for (name, node) in g.nodes() {
            let path = prefixed(prefix, std::slice::from_ref(name));
            match node {
                NodeValue::Alias(_) => {}
                NodeValue::Subgraph(sub) => {
                    if !upward.contains_key(&path) {
                        self.roots(sub, &path, upward, roots);
                    }
                }
                NodeValue::Leaf(_) => {
                    if upward.get(&path).map_or(true, BTreeSet::is_empty) {
                        roots.push(path);
                    }
                }
            }
        }
    }
}

fn prefixed(prefix: &[String], path: &[String]) -> Path {
    prefix.iter().chain(path.iter()).cloned().collect()
}

fn neighbours(map: &Adjacency, path: &Path) -> Vec<Path> {
    map.get(path)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default()
}

/// Depth-first search from `start` with an explicit stack.
///
/// Every newly reached path is added to `seen`; a path reached while still on
/// the active stack closes a cycle.
fn explore(
    start: &Path,
    down: &Adjacency,
    seen: &mut HashSet<Path>,
) -> Result<(), CycleError> {
    if !seen.insert(start.clone()) {
        return Ok(());
    }
    let mut stack: Vec<(Path, Vec<Path>)> = vec![(start.clone(), neighbours(down, start))];
    let mut on_stack: HashSet<Path> = HashSet::from([start.clone()]);

    loop {
        let next = match stack.last_mut() {
            Some((_, pending)) => pending.pop(),
            None => break,
        };
        match next {
            Some(next) => {
                if on_stack.contains(&next) {
                    let position = stack
                        .iter()
                        .position(|(p, _)| *p == next)
                        .unwrap_or(0);
                    let mut cycle: Vec<Path> =
                        stack[position..].iter().map(|(p, _)| p.clone()).collect();
                    cycle.push(next);
                    return Err(CycleError { cycle });
                }
                if seen.insert(next.clone()) {
                    on_stack.insert(next.clone());
                    let children = neighbours(down, &next);
                    stack.push((next, children));
                }
            }
            None => {
                if let Some((finished, _)) = stack.pop() {
                    on_stack.remove(&finished);
                }
            }
        }
    }
    Ok(())
}

/// Walk `g` in `direction`, visiting every reachable leaf after its children.
///
/// `visit` receives the results of the node's children (in path order), the
/// node's value and its [`WalkContext`]. Returns one `(root path, result)`
/// pair per root, in discovery order.
pub fn walk<R, F>(g: &Graph, direction: Direction, mut visit: F) -> Result<Vec<(Path, R)>, CycleError>
where
    R: Clone,
    F: FnMut(Vec<R>, &NodeValue, &WalkContext<'_>) -> R,
{
    let flat = Flattened::new(g);
    let (down, up) = flat.edges(direction);

    let mut roots = Vec::new();
    flat.roots(g, &[], up, &mut roots);

    let mut seen = HashSet::new();
    for start in roots.iter().chain(flat.order.iter()) {
        explore(start, down, &mut seen)?;
    }

    let root_set: HashSet<&Path> = roots.iter().collect();
    let mut memo: HashMap<Path, R> = HashMap::new();
    let mut results = Vec::with_capacity(roots.len());
    for start in &roots {
        if let Some(&entry) = flat.index.get(start) {
            let result = visit_path(start, entry, &flat, down, up, &root_set, &mut memo, &mut visit);
            results.push((start.clone(), result));
        }
    }
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn visit_path<'a, R, F>(
    path: &Path,
    (graph, node): (&'a Graph, &'a NodeValue),
    flat: &Flattened<'a>,
    down: &Adjacency,
    up: &Adjacency,
    roots: &HashSet<&Path>,
    memo: &mut HashMap<Path, R>,
    visit: &mut F,
) -> R
where
    R: Clone,
    F: FnMut(Vec<R>, &NodeValue, &WalkContext<'_>) -> R,
{
    if let Some(done) = memo.get(path) {
        return done.clone();
    }

    let children = neighbours(down, path);
    let mut child_results: Vec<R> = Vec::with_capacity(children.len());
    for child in &children {
        if let Some(&entry) = flat.index.get(child) {
            child_results.push(visit_path(child, entry, flat, down, up, roots, memo, visit));
        }
    }

    let ctx = WalkContext {
        path: path.clone(),
        graph,
        is_root: roots.contains(path),
        is_leaf: children.is_empty(),
        parents: neighbours(up, path),
        children,
    };
    let result = visit(child_results, node, &ctx);

    memo.insert(path.clone(), result.clone());
    result
}
