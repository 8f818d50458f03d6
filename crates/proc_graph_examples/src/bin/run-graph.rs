use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use proc_graph::prelude::*;
use proc_graph_examples::{init_tracing, print_outputs};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "run-graph")]
#[command(about = "Read a graph from its text form, run it and report the outputs")]
struct Cli {
    /// Path to a graph text file
    graph: PathBuf,

    /// Seed for the `random` built-ins
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Maximum script call depth during evaluation
    #[arg(long, default_value = "64")]
    max_depth: usize,

    /// Number of passes to run
    #[arg(long, default_value = "1")]
    passes: usize,

    /// Print the graph back out in text form after reading it
    #[arg(long)]
    echo: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let source = std::fs::read_to_string(&cli.graph)
        .with_context(|| format!("reading {}", cli.graph.display()))?;
    let mut graph = read_graph(&source).with_context(|| format!("parsing {}", cli.graph.display()))?;
    info!(
        "Loaded {} nodes and {} edges from {}",
        graph.node_count(),
        graph.edges().len(),
        cli.graph.display()
    );
    if cli.echo {
        print!("{}", write_graph(&graph)?);
    }

    let config = RunConfig::new()
        .with_seed(cli.seed)
        .with_max_evaluation_depth(cli.max_depth);
    let mut runner = GraphRunner::try_new(config)?;
    let mut warnings = FnSink::new(|event: ExecutionEvent| {
        if let ExecutionEvent::Warning { context, message } = &event {
            warn!("{context}: {message}");
        }
    });

    for pass in 0..cli.passes.max(1) {
        let result = runner.run_with_events(&mut graph, &mut warnings)?;
        println!("pass {}", pass + 1);
        print_outputs(&graph, &result);
    }
    Ok(())
}
