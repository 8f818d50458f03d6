use std::time::Duration;

use criterion::{Criterion, Throughput};
use proc_graph::prelude::*;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// `rect -> t0 -> ... -> t{len-1} -> out`, where every hop between two
/// operations passes through an output/input interface pair. Each
/// translation reads the graph parameter `step` through an expression.
#[allow(dead_code)]
pub fn chain_graph(len: usize) -> Result<Graph> {
    let mut graph = Graph::new();
    graph.set_parameter("step", Parameter::value(0.25))?;

    let mut previous = graph.add_operation("rect", "CreateRect")?;
    for i in 0..len {
        let exit = graph.add_output_interface(&format!("exit{i}"), "link")?;
        let entry = graph.add_input_interface(&format!("entry{i}"), "link")?;
        let name = format!("t{i}");
        let translate = graph.add_operation(&name, "Translate")?;
        graph.set_execution_arguments(
            translate,
            &Arguments::new(name.as_str()).with_expression("z", "step * 2.0")?,
        )?;
        graph.create_edge(previous, exit, None, None)?;
        graph.create_edge(exit, entry, None, None)?;
        graph.create_edge(entry, translate, None, None)?;
        previous = translate;
    }

    let out = graph.add_output_interface("out", "out")?;
    graph.create_edge(previous, out, None, None)?;
    Ok(graph)
}
