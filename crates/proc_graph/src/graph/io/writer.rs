//! Writes a graph back out in the format [`super::reader`] reads.
//!
//! Nodes come first in creation order as `name = Type(args) { params }`,
//! followed by one `src -> dst;` line per edge in creation order. Only the
//! interface names given when an edge was created are written, so defaults
//! are resolved the same way when the text is read back.
use std::fmt::Write as _;

use crate::context::Parameter;
use crate::error::{Error, Result};
use crate::graph::io::lexer::escape_expression;
use crate::graph::{Edge, Graph};
use crate::script::lexer::escape;
use crate::value::Value;

/// Serializes `graph`. An empty graph gives an empty string.
pub fn write_graph(graph: &Graph) -> Result<String> {
    let mut out = String::new();
    for node in graph.nodes() {
        let _ = write!(out, "{} = {}", node.name(), node.type_name());

        let construction = node.behavior().construction_arguments();
        if !construction.is_empty() {
            let fields = construction
                .iter()
                .map(|(name, value)| Ok(format!("{}: {}", name, write_value(name, value)?)))
                .collect::<Result<Vec<_>>>()?;
            let _ = write!(out, "({})", fields.join(", "));
        }

        let parameters = graph
            .contexts()
            .parameters(node.context())
            .map(|(name, parameter)| Ok(format!("{}: {}", name, write_parameter(name, parameter)?)))
            .collect::<Result<Vec<_>>>()?;
        if parameters.is_empty() {
            out.push_str(";\n");
        } else {
            let _ = writeln!(out, " {{ {} }}", parameters.join(", "));
        }
    }
    for edge in graph.edges() {
        write_edge(graph, edge, &mut out);
    }
    Ok(out)
}

fn write_edge(graph: &Graph, edge: &Edge, out: &mut String) {
    let name = |id| graph.node(id).map(|n| n.name()).unwrap_or("?");
    out.push_str(name(edge.source));
    if let Some(interface) = &edge.out_interface {
        let _ = write!(out, ">{}", interface);
    }
    out.push_str(" -> ");
    if let Some(interface) = &edge.in_interface {
        let _ = write!(out, "{}<", interface);
    }
    out.push_str(name(edge.target));
    out.push_str(";\n");
}

pub fn write_parameter(name: &str, parameter: &Parameter) -> Result<String> {
    match parameter {
        Parameter::Value(value) => write_value(name, value),
        Parameter::Expression(expression) => Ok(escape_expression(expression.source())),
    }
}

/// Literal text of a value. Callables, object references and non-finite
/// floats have none.
pub fn write_value(name: &str, value: &Value) -> Result<String> {
    let finite = match value {
        Value::Float(x) => x.is_finite(),
        Value::Vector3(v) => v.is_finite(),
        Value::Plane(p) => p.point().is_finite() && p.normal().is_finite(),
        _ => true,
    };
    if !finite {
        return Err(Error::InvalidArgument {
            argument: name.to_owned(),
            message: format!("a non-finite {} cannot be written as text", value.type_name()),
        });
    }
    Ok(match value {
        Value::Null => "null".into(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(x) => format!("{:.6}", x),
        Value::String(s) => escape(s),
        Value::Vector3(v) => format!("Vector3({:.6}, {:.6}, {:.6})", v.x, v.y, v.z),
        Value::Plane(p) => {
            let (point, normal) = (p.point(), p.normal());
            format!(
                "Plane({:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6})",
                point.x, point.y, point.z, normal.x, normal.y, normal.z
            )
        }
        Value::Callable(_) | Value::Object(_) => {
            return Err(Error::InvalidArgument {
                argument: name.to_owned(),
                message: format!("a {} value cannot be written as text", value.type_name()),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::io::read_graph;
    use crate::graph::Arguments;

    #[test]
    fn empty_graph_writes_nothing() {
        assert_eq!(write_graph(&Graph::new()).expect("writes"), "");
    }

    #[test]
    fn writes_nodes_then_edges() {
        let mut graph = Graph::new();
        let input = graph.add_input_interface("in", "in").expect("in");
        let op = graph.add_operation("op", "CreateRect").expect("op");
        graph
            .set_execution_arguments(
                op,
                &Arguments::new("op")
                    .with_value("width", 2.0)
                    .with_expression("height", "w / 2.0")
                    .expect("parses"),
            )
            .expect("args");
        let out = graph.add_output_interface("out", "out").expect("out");
        graph.create_edge(input, op, None, None).expect("in -> op");
        graph.create_edge(op, out, Some("out"), None).expect("op -> out");

        let text = write_graph(&graph).expect("writes");
        assert_eq!(
            text,
            "in = InputInterface(interface: \"in\");\n\
             op = Operation(operation: \"CreateRect\") { height: $w / 2.0$, plane: \"z\", width: 2.000000 }\n\
             out = OutputInterface(interface: \"out\");\n\
             in -> op;\n\
             op>out -> out;\n"
        );
    }

    #[test]
    fn write_read_write_is_stable() {
        let source = r#"
            seed = Parameter { count: 3, label: "a \"quoted\" name", on: true }
            in = InputInterface(interface: "in");
            lift = Translate { z: $count * 0.5$ }
            grow = Scale { pivotal_point: "world_origin", x: 2 }
            out = OutputInterface(interface: "out");
            seed -> lift;
            in -> lift -> out;
            box = CreateBox;
            box>out -> out<out;
        "#;
        let first = read_graph(source).expect("reads");
        let text = write_graph(&first).expect("writes");
        let second = read_graph(&text).expect("reads back");
        assert_eq!(write_graph(&second).expect("writes again"), text);

        assert_eq!(first.node_count(), second.node_count());
        for (a, b) in first.nodes().zip(second.nodes()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.type_name(), b.type_name());
        }
        assert_eq!(first.edges(), second.edges());
    }

    #[test]
    fn plane_values_round_trip_through_text() {
        let mut graph = Graph::new();
        graph
            .add_parameter_node(
                "p",
                &Arguments::new("p").with_value(
                    "cut",
                    crate::value::Plane::from_point_normal(glam::Vec3::new(0.0, 0.0, 2.0), glam::Vec3::Z),
                ),
            )
            .expect("p");
        let text = write_graph(&graph).expect("writes");
        assert_eq!(
            text,
            "p = Parameter { cut: Plane(0.000000, 0.000000, 2.000000, 0.000000, 0.000000, 1.000000) }\n"
        );
        let again = read_graph(&text).expect("reads");
        assert_eq!(write_graph(&again).expect("writes"), text);
    }

    #[test]
    fn expressions_containing_dollars_round_trip() {
        let source = r#""a$b" + "c\\d$""#;
        let mut graph = Graph::new();
        graph
            .add_parameter_node(
                "p",
                &Arguments::new("p").with_expression("s", source).expect("parses"),
            )
            .expect("p");
        let text = write_graph(&graph).expect("writes");
        let again = read_graph(&text).expect("reads back");
        let id = again.node_id("p").expect("p");
        let parameter = again.node_parameter(id, "s").expect("s");
        assert_eq!(parameter.as_expression().map(|e| e.source()), Some(source));
        assert_eq!(write_graph(&again).expect("writes again"), text);
    }

    #[test]
    fn non_finite_floats_cannot_be_written() {
        for value in [
            Value::Float(f32::NAN),
            Value::Float(f32::INFINITY),
            Value::Vector3(glam::Vec3::new(0.0, f32::NEG_INFINITY, 0.0)),
        ] {
            let err = write_value("x", &value).expect_err("non-finite");
            assert!(matches!(err, Error::InvalidArgument { ref argument, .. } if argument == "x"));
        }
        assert_eq!(write_value("x", &Value::Float(-1.5)).expect("finite"), "-1.500000");
    }

    #[test]
    fn object_references_cannot_be_written() {
        let err = write_value("f", &Value::Object(crate::objects::ObjectArena::new().insert(
            crate::objects::ProceduralObject::new(),
        )))
        .expect_err("object");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
