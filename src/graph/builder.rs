// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology construction.
//!
//! [`graph`] takes a set of named nodes and a list of links and resolves every
//! link endpoint down to a concrete leaf path. Resolution follows aliases
//! (detecting alias loops), descends into embedded subgraphs, and substitutes
//! a subgraph's boundary port (`out` when the subgraph is the source of a
//! link, `in` when it is the destination) when the endpoint names the
//! subgraph itself.
//!
//! The resulting [`Graph`] stores resolved edges twice, once in `outputs`
//! keyed by source and once in `inputs` keyed by destination, so both walk
//! directions are a single lookup away. Duplicate links collapse.

use crate::errors::ConstructionError;
use crate::graph::node::NodeValue;
use crate::graph::path::{deref, normalize, root, Path, PathRef, Target};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Name of the boundary node a subgraph exposes as its input port.
pub const IN_PORT: &str = "in";
/// Name of the boundary node a subgraph exposes as its output port.
pub const OUT_PORT: &str = "out";

/// An immutable topology of named nodes and resolved directed edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<String, NodeValue>,
    inputs: BTreeMap<Path, BTreeSet<Path>>,
    outputs: BTreeMap<Path, BTreeSet<Path>>,
}

impl Graph {
    pub fn nodes(&self) -> &BTreeMap<String, NodeValue> {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&NodeValue> {
        self.nodes.get(name)
    }

    /// Edges keyed by destination path.
    pub fn inputs(&self) -> &BTreeMap<Path, BTreeSet<Path>> {
        &self.inputs
    }

    /// Edges keyed by source path.
    pub fn outputs(&self) -> &BTreeMap<Path, BTreeSet<Path>> {
        &self.outputs
    }

    pub fn inputs_of(&self, path: &[String]) -> Option<&BTreeSet<Path>> {
        self.inputs.get(path)
    }

    pub fn outputs_of(&self, path: &[String]) -> Option<&BTreeSet<Path>> {
        self.outputs.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by full path, descending through subgraphs.
    pub fn node_at(&self, path: &[String]) -> Option<&NodeValue> {
        let (head, rest) = path.split_first()?;
        let node = self.nodes.get(head)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_subgraph().and_then(|g| g.node_at(rest))
    }

    fn connect(&mut self, from: Path, to: Path) {
        self.outputs
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.inputs.entry(to).or_default().insert(from);
    }
}

/// A chain of link endpoints; every consecutive pair becomes an edge.
///
/// An endpoint that normalizes to several paths links each of them, so
/// `Link::new(vec!["a", "b"], "c")` connects both `a` and `b` to `c`.
#[derive(Debug, Clone)]
pub struct Link {
    endpoints: Vec<Target>,
}

impl Link {
    pub fn new(from: impl Into<Target>, to: impl Into<Target>) -> Self {
        Self {
            endpoints: vec![from.into(), to.into()],
        }
    }

    pub fn chain<T: Into<Target>>(endpoints: impl IntoIterator<Item = T>) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    pub fn endpoints(&self) -> &[Target] {
        &self.endpoints
    }
}

impl<A: Into<Target>, B: Into<Target>> From<(A, B)> for Link {
    fn from((from, to): (A, B)) -> Self {
        Link::new(from, to)
    }
}

/// Build a graph from named nodes and links.
///
/// ```
/// use dagstream::graph::{graph, Link, NodeValue};
///
/// let g = graph(
///     vec![("a", NodeValue::from(43)), ("b", NodeValue::from(true))],
///     vec![Link::new("a", "b")],
/// )
/// .unwrap();
/// assert!(g.outputs_of(&["a".to_string()]).unwrap().contains(&vec!["b".to_string()]));
/// ```
pub fn graph<K, N, L>(
    nodes: impl IntoIterator<Item = (K, N)>,
    links: impl IntoIterator<Item = L>,
) -> Result<Graph, ConstructionError>
where
    K: Into<String>,
    N: Into<NodeValue>,
    L: Into<Link>,
{
    let mut g = Graph {
        nodes: nodes
            .into_iter()
            .map(|(name, node)| (name.into(), node.into()))
            .collect(),
        ..Graph::default()
    };

    for link in links {
        let link = link.into();
        for pair in link.endpoints.windows(2) {
            let sources = normalize(&pair[0]);
            let destinations = normalize(&pair[1]);
            for src in &sources {
                let from = resolve(&g.nodes, src, OUT_PORT)?;
                for dst in &destinations {
                    let to = resolve(&g.nodes, dst, IN_PORT)?;
                    g.connect(from.clone(), to);
                }
            }
        }
    }

    Ok(g)
}

/// A linear graph `0 -> 1 -> ... -> n-1` with `in` and `out` aliasing its ends.
pub fn chain<N: Into<NodeValue>>(values: impl IntoIterator<Item = N>) -> Result<Graph, ConstructionError> {
    let mut nodes: Vec<(String, NodeValue)> = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v.into()))
        .collect();
    let count = nodes.len();

    let links: Vec<Link> = (1..count)
        .map(|i| Link::new(root().at((i - 1).to_string()), root().at(i.to_string())))
        .collect();

    if count > 0 {
        nodes.push((IN_PORT.to_string(), NodeValue::alias(root().at("0"))));
        nodes.push((
            OUT_PORT.to_string(),
            NodeValue::alias(root().at((count - 1).to_string())),
        ));
    }

    graph(nodes, links)
}

/// Resolve one endpoint path against `nodes` down to a leaf path.
///
/// `port` is the boundary substituted when the endpoint stops at a subgraph.
fn resolve(
    nodes: &BTreeMap<String, NodeValue>,
    endpoint: &[String],
    port: &str,
) -> Result<Path, ConstructionError> {
    resolve_at(nodes, endpoint.to_vec(), port, endpoint)
}

fn resolve_at(
    nodes: &BTreeMap<String, NodeValue>,
    path: Path,
    port: &str,
    endpoint: &[String],
) -> Result<Path, ConstructionError> {
    let mut current = path;
    let mut followed = vec![current.clone()];
    let mut visited: HashSet<String> = HashSet::new();

    loop {
        let (head, rest) = current
            .split_first()
            .ok_or(ConstructionError::EmptyPath)?;
        let node = nodes
            .get(head)
            .ok_or_else(|| ConstructionError::UndefinedNode {
                endpoint: endpoint.to_vec(),
                name: head.clone(),
            })?;

        match node {
            NodeValue::Alias(target) => {
                let mut next = deref(target);
                next.extend(rest.iter().cloned());
                if !visited.insert(head.clone()) {
                    followed.push(next);
                    return Err(ConstructionError::AliasLoop {
                        endpoint: endpoint.to_vec(),
                        chain: followed,
                    });
                }
                followed.push(next.clone());
                current = next;
            }
            NodeValue::Subgraph(sub) => {
                let inner = if rest.is_empty() {
                    if !sub.nodes.contains_key(port) {
                        return Err(ConstructionError::MissingBoundary {
                            endpoint: endpoint.to_vec(),
                            subgraph: head.clone(),
                            port: port.to_string(),
                        });
                    }
                    vec![port.to_string()]
                } else {
                    rest.to_vec()
                };
                let mut resolved = vec![head.clone()];
                resolved.extend(resolve_at(&sub.nodes, inner, port, endpoint)?);
                return Ok(resolved);
            }
            NodeValue::Leaf(_) => {
                if !rest.is_empty() {
                    return Err(ConstructionError::NotASubgraph {
                        endpoint: endpoint.to_vec(),
                        name: head.clone(),
                    });
                }
                return Ok(current);
            }
        }
    }
}

/// Convenience for building a reference to a top-level node.
pub fn node_ref(name: &str) -> PathRef {
    root().at(name)
}
