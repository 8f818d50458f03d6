use glam::Vec3;
use proc_graph::prelude::*;
use proc_graph_examples::{init_tracing, print_outputs};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // rect -> shape_out -> shape_in -> lift -> out
    // user -> shift -> out
    //
    // The rectangle's height follows the graph parameter `base`, and the
    // translation reads the rectangle's width through an expression. A box
    // pushed into `user` is shifted sideways and joins the same output.
    let mut graph = Graph::new();
    graph.set_parameter("base", Parameter::value(1.5))?;

    let rect = graph.add_operation("rect", "CreateRect")?;
    graph.set_execution_arguments(
        rect,
        &Arguments::new("rect")
            .with_value("width", 4.0)
            .with_expression("height", "base * 2.0")?,
    )?;
    let shape_out = graph.add_output_interface("shape_out", "shape")?;
    let shape_in = graph.add_input_interface("shape_in", "shape")?;
    let lift = graph.add_operation("lift", "Translate")?;
    graph.set_execution_arguments(
        lift,
        &Arguments::new("lift").with_expression("z", "rect.width / 4.0")?,
    )?;
    let user = graph.add_input_interface("user", "in")?;
    let shift = graph.add_operation("shift", "Translate")?;
    graph.set_execution_arguments(shift, &Arguments::new("shift").with_value("x", -3.0))?;
    let out = graph.add_output_interface("out", "out")?;

    graph.create_edge(rect, shape_out, None, None)?;
    graph.create_edge(shape_out, shape_in, None, None)?;
    graph.create_edge(shape_in, lift, None, None)?;
    graph.create_edge(lift, out, None, None)?;
    graph.create_edge(user, shift, None, None)?;
    graph.create_edge(shift, out, None, None)?;

    let mut crate_box = ProceduralObject::with_geometry(Geometry::cuboid(Vec3::new(1.0, 1.0, 2.0)));
    crate_box.set_attribute("label", "crate");
    graph.push_object(user, crate_box)?;

    let mut events = VecSink::only([ExecutionEventKind::NodeFinished]);
    let result = GraphRunner::try_new(RunConfig::new().with_seed(7))?
        .run_with_events(&mut graph, &mut events)?;

    for event in events.as_slice() {
        if let ExecutionEvent::NodeFinished { name, produced, .. } = event {
            tracing::info!("{name} produced {produced} object(s)");
        }
    }
    print_outputs(&graph, &result);
    Ok(())
}
