#![forbid(unsafe_code)]

use proc_graph::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` to override. Defaults to `info` everywhere and `debug` for
/// the graph runner.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,proc_graph::graph::runner=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Prints the objects waiting on every terminal output interface.
pub fn print_outputs(graph: &Graph, result: &RunResult) {
    println!(
        "{} visits, {} objects created, {} discarded",
        result.visits, result.objects_created, result.objects_discarded
    );
    for (name, count) in &result.outputs {
        println!("{name}: {count} object(s)");
        let Some(id) = graph.node_id(name) else {
            continue;
        };
        for object in graph.objects_at(id) {
            match object.geometry.as_ref().and_then(|g| g.bounds()) {
                Some((min, max)) => println!(
                    "  {} vertices, bounds ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    object.geometry.as_ref().map_or(0, |g| g.vertex_count()),
                    min.x,
                    min.y,
                    min.z,
                    max.x,
                    max.y,
                    max.z
                ),
                None => println!("  no geometry"),
            }
            for (key, value) in &object.attributes {
                println!("    {key} = {value}");
            }
        }
    }
}
