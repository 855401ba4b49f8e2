// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::process;

use anyhow::Context;
use dagstream::config::load_graph;
use dagstream::engine::{run_in, Environment};
use dagstream::observability::init_tracing;
use dagstream::value::Value;

#[tokio::main]
async fn main() {
    init_tracing(None);

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <topology.yaml|topology.toml> [args ...]", args[0]);
        eprintln!("Example: {} configs/ticker.yaml", args[0]);
        eprintln!("Example: {} configs/listing.toml /tmp", args[0]);
        process::exit(1);
    }

    if let Err(e) = run_topology(&args[1], &args[2..]).await {
        eprintln!("Failed to run {}: {:#}", args[1], e);
        process::exit(1);
    }
}

/// Load one topology file and run it until its sources finish or Ctrl-C.
async fn run_topology(path: &str, run_args: &[String]) -> anyhow::Result<()> {
    let (g, options) = load_graph(path)?;
    let env = Environment::builder()
        .options(options)
        .args(Value::List(run_args.iter().map(|a| Value::from(a.as_str())).collect()))
        .build();

    let stopper = env.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.shutdown();
        }
    });

    run_in(&env, &g)
        .await
        .with_context(|| format!("run of '{}' failed", path))
}
