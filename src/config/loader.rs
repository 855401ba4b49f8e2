// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_TIMER_INTERVAL_MS, MIN_TIMER_INTERVAL_MS};
use crate::config::operators::build_operator;
use crate::errors::ConfigError;
use crate::graph::{graph, root, sink, source, Graph, Link, NodeValue, PathRef};
use crate::observability::messages::config::ConfigLoaded;
use crate::observability::messages::StructuredLog;
use crate::value::Value;
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A topology file: run options plus the nodes and links of the top-level graph.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: RunOptions,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub links: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunOptions {
    #[serde(default = "default_timer_interval_ms")]
    pub timer_interval_ms: u64,
}

fn default_timer_interval_ms() -> u64 {
    DEFAULT_TIMER_INTERVAL_MS
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timer_interval_ms: DEFAULT_TIMER_INTERVAL_MS,
        }
    }
}

impl RunOptions {
    /// The default `timer` period, never shorter than the minimum.
    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.timer_interval_ms.max(MIN_TIMER_INTERVAL_MS))
    }
}

/// One node declaration. `kind` selects the variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    Value {
        #[serde(default)]
        value: JsonValue,
    },
    Op {
        op: String,
        #[serde(default)]
        args: JsonValue,
    },
    Source {
        #[serde(rename = "type")]
        name: String,
        #[serde(default)]
        config: JsonValue,
    },
    Sink {
        #[serde(rename = "type")]
        name: String,
        #[serde(default)]
        config: JsonValue,
    },
    Alias {
        target: String,
    },
    Graph(SubgraphConfig),
}

/// A nested topology declared inline.
#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphConfig {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub links: Vec<Vec<String>>,
}

impl Config {
    /// Build the declared topology.
    pub fn build_graph(&self) -> Result<Graph, ConfigError> {
        build_topology(&self.nodes, &self.links)
    }
}

fn dotted(path: &str) -> PathRef {
    path.split('.').fold(root(), |r, segment| r.at(segment))
}

fn build_topology(
    nodes: &BTreeMap<String, NodeConfig>,
    links: &[Vec<String>],
) -> Result<Graph, ConfigError> {
    let mut built = Vec::with_capacity(nodes.len());
    for (name, node) in nodes {
        built.push((name.clone(), build_node(name, node)?));
    }

    let mut chains = Vec::with_capacity(links.len());
    for (index, link) in links.iter().enumerate() {
        if link.len() < 2 {
            return Err(ConfigError::ShortLink {
                index,
                len: link.len(),
            });
        }
        chains.push(Link::chain(link.iter().map(|p| dotted(p))));
    }

    Ok(graph(built, chains)?)
}

fn build_node(name: &str, node: &NodeConfig) -> Result<NodeValue, ConfigError> {
    Ok(match node {
        NodeConfig::Value { value } => NodeValue::value(Value::from(value.clone())),
        NodeConfig::Op { op, args } => NodeValue::op(build_operator(name, op, args)?),
        NodeConfig::Source { name, config } => source(name.as_str(), Value::from(config.clone())),
        NodeConfig::Sink { name, config } => sink(name.as_str(), Value::from(config.clone())),
        NodeConfig::Alias { target } => NodeValue::alias(dotted(target)),
        NodeConfig::Graph(sub) => NodeValue::subgraph(build_topology(&sub.nodes, &sub.links)?),
    })
}

/// Load a topology from a YAML or TOML file (chosen by extension).
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read topology file '{}'", path.display()))?;

    let cfg: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("invalid TOML topology '{}'", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML topology '{}'", path.display()))?,
    };

    let location = path.display().to_string();
    ConfigLoaded {
        path: &location,
        node_count: cfg.nodes.len(),
        link_count: cfg.links.len(),
    }
    .log();
    Ok(cfg)
}

/// Load a topology file and build its graph.
pub fn load_graph<P: AsRef<Path>>(path: P) -> anyhow::Result<(Graph, RunOptions)> {
    let path = path.as_ref();
    let cfg = load_config(path)?;
    let g = cfg
        .build_graph()
        .with_context(|| format!("invalid topology in '{}'", path.display()))?;
    Ok((g, cfg.options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Leaf, IN_PORT};

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
options:
  timer_interval_ms: 250
nodes:
  tick:
    kind: source
    type: timer
  first:
    kind: op
    op: take
    args: 3
  out:
    kind: sink
    type: log
links:
  - [tick, first, out]
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.options.timer_interval_ms, 250);
        assert_eq!(cfg.nodes.len(), 3);
        assert!(matches!(cfg.nodes["first"], NodeConfig::Op { .. }));
        assert_eq!(cfg.links, vec![vec!["tick", "first", "out"]]);
    }

    #[test]
    fn test_options_default_when_missing() {
        let cfg: Config = serde_yaml::from_str("nodes: {}").unwrap();
        assert_eq!(cfg.options, RunOptions::default());
        assert_eq!(
            cfg.options.timer_interval(),
            Duration::from_millis(DEFAULT_TIMER_INTERVAL_MS)
        );
    }

    #[test]
    fn test_timer_interval_is_clamped() {
        let options = RunOptions {
            timer_interval_ms: 0,
        };
        assert_eq!(options.timer_interval(), Duration::from_millis(MIN_TIMER_INTERVAL_MS));
    }

    #[test]
    fn test_build_graph_with_subgraph_and_alias() {
        let yaml = r#"
nodes:
  src:
    kind: value
    value: 1
  inner:
    kind: graph
    nodes:
      double:
        kind: op
        op: multiply
        args: 2
      in:
        kind: alias
        target: double
      out:
        kind: alias
        target: double
    links: []
  dst:
    kind: sink
    type: debug
links:
  - [src, inner, dst]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let g = cfg.build_graph().unwrap();

        let src = vec!["src".to_string()];
        let double = vec!["inner".to_string(), "double".to_string()];
        assert!(g.outputs_of(&src).unwrap().contains(&double));
        assert!(matches!(
            g.node_at(&["inner".to_string(), IN_PORT.to_string()]),
            Some(NodeValue::Alias(_))
        ));
        assert!(matches!(
            g.node("dst"),
            Some(NodeValue::Leaf(Leaf::Sink(_)))
        ));
    }

    #[test]
    fn test_short_link_is_rejected() {
        let yaml = r#"
nodes:
  a:
    kind: value
links:
  - [a]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.build_graph().unwrap_err(),
            ConfigError::ShortLink { index: 0, len: 1 }
        );
    }

    #[test]
    fn test_undefined_link_target_is_construction_error() {
        let yaml = r#"
nodes:
  a:
    kind: value
links:
  - [a, nowhere]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            cfg.build_graph(),
            Err(ConfigError::Construction(_))
        ));
    }

    #[test]
    fn test_load_config_reads_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.toml");
        fs::write(
            &path,
            r#"
links = [["a", "b"]]

[options]
timer_interval_ms = 10

[nodes.a]
kind = "value"
value = 1

[nodes.b]
kind = "sink"
type = "log"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.options.timer_interval_ms, 10);
        assert_eq!(cfg.build_graph().unwrap().nodes().len(), 2);
    }

    #[test]
    fn test_load_config_missing_file_has_context() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
