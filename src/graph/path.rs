// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Symbolic addressing of node locations.
//!
//! A [`PathRef`] is built incrementally from [`root()`]: every call to
//! [`PathRef::at`] returns a new, deeper reference and leaves the original
//! untouched. References are values with identity; two references built
//! independently to the same location are different objects, and only their
//! segment sequences (see [`deref`]) compare equal.
//!
//! ```
//! use dagstream::graph::{root, deref};
//!
//! let sub = root().at("filter");
//! let port = sub.at("in");
//! assert_eq!(deref(&port), vec!["filter".to_string(), "in".to_string()]);
//! assert_eq!(deref(&sub).len(), 1);
//! ```

use crate::value::Value;
use std::sync::Arc;

/// A resolved location: the segment sequence of a node inside a graph.
pub type Path = Vec<String>;

/// An immutable, chainable reference to a node location.
#[derive(Debug, Clone)]
pub struct PathRef {
    segments: Arc<[String]>,
}

impl PathRef {
    /// The empty reference every path is built from
    pub fn root() -> Self {
        Self {
            segments: Arc::from(Vec::new()),
        }
    }

    /// A new reference one segment deeper
    pub fn at(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(segment.into());
        Self {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Identity comparison: true only for clones of one constructed reference.
    pub fn same(&self, other: &PathRef) -> bool {
        Arc::ptr_eq(&self.segments, &other.segments)
    }
}

/// Shorthand for [`PathRef::root`].
pub fn root() -> PathRef {
    PathRef::root()
}

/// The segment sequence a reference points at.
pub fn deref(path: &PathRef) -> Path {
    path.segments.to_vec()
}

/// Anything accepted as a link endpoint.
///
/// A plain value is allowed so that callers can pass through data that is not
/// an address; it normalizes to no paths at all.
#[derive(Debug, Clone)]
pub enum Target {
    Ref(PathRef),
    Many(Vec<Target>),
    Plain(Value),
}

impl Target {
    pub fn is_path_ref(&self) -> bool {
        matches!(self, Target::Ref(_))
    }
}

/// Flatten a target into the ordered list of segment sequences it addresses.
pub fn normalize(target: &Target) -> Vec<Path> {
    let mut paths = Vec::new();
    collect(target, &mut paths);
    paths
}

fn collect(target: &Target, paths: &mut Vec<Path>) {
    match target {
        Target::Ref(r) => paths.push(deref(r)),
        Target::Many(items) => items.iter().for_each(|t| collect(t, paths)),
        Target::Plain(_) => {}
    }
}

impl From<PathRef> for Target {
    fn from(r: PathRef) -> Self {
        Target::Ref(r)
    }
}

impl From<&PathRef> for Target {
    fn from(r: &PathRef) -> Self {
        Target::Ref(r.clone())
    }
}

/// A bare name addresses a top-level node.
impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Ref(root().at(name))
    }
}

impl From<Value> for Target {
    fn from(v: Value) -> Self {
        Target::Plain(v)
    }
}

impl<T: Into<Target>> From<Vec<T>> for Target {
    fn from(items: Vec<T>) -> Self {
        Target::Many(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_does_not_mutate_parent() {
        let a = root().at("a");
        let ab = a.at("b");
        assert_eq!(deref(&a), vec!["a"]);
        assert_eq!(deref(&ab), vec!["a", "b"]);
        assert!(root().is_root());
    }

    #[test]
    fn test_independent_refs_are_distinct() {
        let first = root().at("x");
        let second = root().at("x");
        assert!(!first.same(&second));
        assert!(first.same(&first.clone()));
        assert_eq!(deref(&first), deref(&second));
    }

    #[test]
    fn test_normalize_flattens_nested_lists() {
        let target = Target::Many(vec![
            Target::from("a"),
            Target::from(vec![root().at("s").at("in"), root().at("b")]),
            Target::Plain(Value::Int(7)),
        ]);
        assert_eq!(
            normalize(&target),
            vec![
                vec!["a".to_string()],
                vec!["s".to_string(), "in".to_string()],
                vec!["b".to_string()],
            ]
        );
    }

    #[test]
    fn test_plain_value_normalizes_to_nothing() {
        let target = Target::from(Value::from("not a path"));
        assert!(!target.is_path_ref());
        assert!(normalize(&target).is_empty());
    }
}
