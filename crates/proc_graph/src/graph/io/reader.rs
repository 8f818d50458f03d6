//! Reads the graph text format into graph-construction calls.
//!
//! ```text
//! file     -> item*
//! item     -> node | links
//! node     -> IDENT "=" IDENT ( "(" fields? ")" )? ( "{" fields? "}" )? ";"?
//! fields   -> IDENT ":" value ( "," IDENT ":" value )* ","?
//! value    -> literal | EXPRESSION | "Vector3" "(" num "," num "," num ")"
//!           | "Plane" "(" num ( "," num ){5} ")"
//! links    -> endpoint ( "->" endpoint )+ ";"
//! endpoint -> ( IDENT "<" )? IDENT ( ">" IDENT )?
//! ```
//!
//! A node type that is not a registered node kind but names a registered
//! operation is read as an `Operation` node running it.
use std::ops::Range;

use glam::Vec3;

use crate::context::Parameter;
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::graph::io::lexer::{tokenize, GraphToken};
use crate::graph::{Arguments, Graph, NodeId, OperationNode};
use crate::script::ParseError;
use crate::value::{Plane, Value};

/// Parses `source` into a new graph with the default factories.
pub fn read_graph(source: &str) -> Result<Graph> {
    let mut graph = Graph::new();
    read_into(&mut graph, source)?;
    Ok(graph)
}

/// Parses `source`, adding its nodes and edges to `graph`.
pub fn read_into(graph: &mut Graph, source: &str) -> Result<()> {
    let tokens = tokenize(source)?;
    GraphReader {
        tokens,
        pos: 0,
        end: source.len(),
        graph,
    }
    .read()
}

struct Endpoint {
    node: NodeId,
    in_interface: Option<String>,
    out_interface: Option<String>,
}

struct GraphReader<'a> {
    tokens: Vec<(GraphToken, Range<usize>)>,
    pos: usize,
    end: usize,
    graph: &'a mut Graph,
}

impl GraphReader<'_> {
    fn read(mut self) -> Result<()> {
        while self.pos < self.tokens.len() {
            if matches!(self.peek_at(1), Some(GraphToken::Assign)) {
                self.node()?;
            } else {
                self.links()?;
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<&GraphToken> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&GraphToken> {
        self.tokens.get(self.pos + ahead).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, span)| span.start)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse(ParseError::new(message, self.offset()))
    }

    fn unexpected(&self, wanted: &str) -> Error {
        match self.peek() {
            Some(token) => self.error(format!("expected {} but found {}", wanted, token.describe())),
            None => self.error(format!("expected {} but reached end of input", wanted)),
        }
    }

    fn eat(&mut self, token: &GraphToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &GraphToken, wanted: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(wanted))
        }
    }

    fn ident(&mut self, wanted: &str) -> Result<String> {
        match self.peek() {
            Some(GraphToken::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(wanted)),
        }
    }

    fn node(&mut self) -> Result<()> {
        let start = self.offset();
        let name = self.ident("node name")?;
        self.expect(&GraphToken::Assign, "'='")?;
        let type_name = self.ident("node type")?;

        let mut construction = if self.eat(&GraphToken::LParen) {
            self.fields(&name, &GraphToken::RParen)?
        } else {
            Arguments::new(name.as_str())
        };
        let execution = if self.eat(&GraphToken::LBrace) {
            self.fields(&name, &GraphToken::RBrace)?
        } else {
            Arguments::new(name.as_str())
        };
        self.eat(&GraphToken::Semicolon);

        if self.graph.node_id(&name).is_some() {
            return Err(Error::Parse(ParseError::new(
                format!("node '{}' is defined twice", name),
                start,
            )));
        }

        let kind = if !self.graph.node_factory().contains(&type_name)
            && self.graph.operation_factory().contains(&type_name)
        {
            construction.insert("operation", Parameter::value(type_name.as_str()));
            OperationNode::TYPE_NAME
        } else {
            type_name.as_str()
        };
        let id = self.graph.create_node(kind, Some(&name))?;
        let outcome = self
            .graph
            .construct_node(id, &construction)
            .and_then(|()| self.graph.set_execution_arguments(id, &execution));
        if let Err(e) = outcome {
            self.graph.destroy_node(id)?;
            return Err(e);
        }
        Ok(())
    }

    fn fields(&mut self, owner: &str, close: &GraphToken) -> Result<Arguments> {
        let mut args = Arguments::new(owner);
        loop {
            if self.eat(close) {
                return Ok(args);
            }
            let key = self.ident("field name")?;
            self.expect(&GraphToken::Colon, "':'")?;
            let value = self.parameter()?;
            args.insert(key, value);
            if !self.eat(&GraphToken::Comma) {
                self.expect(close, &close.describe())?;
                return Ok(args);
            }
        }
    }

    fn parameter(&mut self) -> Result<Parameter> {
        if let Some(GraphToken::Expression(source)) = self.peek() {
            let source = source.clone();
            let offset = self.offset();
            self.pos += 1;
            return Expression::parse(&source)
                .map(Parameter::Expression)
                .map_err(|e| match e {
                    Error::Parse(inner) => Error::Parse(ParseError::new(
                        format!("in expression: {}", inner.message()),
                        offset + 1 + inner.offset(),
                    )),
                    other => other,
                });
        }
        self.value().map(Parameter::Value)
    }

    fn value(&mut self) -> Result<Value> {
        let value = match self.peek() {
            Some(GraphToken::True) => Value::Boolean(true),
            Some(GraphToken::False) => Value::Boolean(false),
            Some(GraphToken::Null) => Value::Null,
            Some(GraphToken::Float(v)) => Value::Float(*v),
            Some(GraphToken::Integer(v)) => Value::Integer(*v),
            Some(GraphToken::Str(s)) => Value::String(s.clone()),
            Some(GraphToken::Ident(kind)) if kind == "Vector3" => {
                self.pos += 1;
                let n = self.numbers(3)?;
                return Ok(Value::Vector3(Vec3::new(n[0], n[1], n[2])));
            }
            Some(GraphToken::Ident(kind)) if kind == "Plane" => {
                self.pos += 1;
                let n = self.numbers(6)?;
                return Ok(Value::Plane(Plane::from_point_normal(
                    Vec3::new(n[0], n[1], n[2]),
                    Vec3::new(n[3], n[4], n[5]),
                )));
            }
            _ => return Err(self.unexpected("a value")),
        };
        self.pos += 1;
        Ok(value)
    }

    fn numbers(&mut self, count: usize) -> Result<Vec<f32>> {
        self.expect(&GraphToken::LParen, "'('")?;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                self.expect(&GraphToken::Comma, "','")?;
            }
            let n = match self.peek() {
                Some(GraphToken::Float(v)) => *v,
                Some(GraphToken::Integer(v)) => *v as f32,
                _ => return Err(self.unexpected("a number")),
            };
            self.pos += 1;
            out.push(n);
        }
        self.expect(&GraphToken::RParen, "')'")?;
        Ok(out)
    }

    fn endpoint(&mut self) -> Result<Endpoint> {
        let offset = self.offset();
        let first = self.ident("node name")?;
        let (in_interface, name) = if self.eat(&GraphToken::Lt) {
            (Some(first), self.ident("node name")?)
        } else {
            (None, first)
        };
        let out_interface = if self.eat(&GraphToken::Gt) {
            Some(self.ident("interface name")?)
        } else {
            None
        };
        let node = self.graph.node_id(&name).ok_or_else(|| {
            Error::Parse(ParseError::new(format!("unknown node '{}'", name), offset))
        })?;
        Ok(Endpoint {
            node,
            in_interface,
            out_interface,
        })
    }

    fn links(&mut self) -> Result<()> {
        let mut previous = self.endpoint()?;
        self.expect(&GraphToken::Arrow, "'->'")?;
        loop {
            let next = self.endpoint()?;
            self.graph.create_edge(
                previous.node,
                next.node,
                previous.out_interface.as_deref(),
                next.in_interface.as_deref(),
            )?;
            previous = next;
            if !self.eat(&GraphToken::Arrow) {
                break;
            }
        }
        self.expect(&GraphToken::Semicolon, "';'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeCategory;

    #[test]
    fn reads_nodes_parameters_and_link_chains() {
        let graph = read_graph(
            r#"
            // a rectangle generator
            in = InputInterface(interface: "in");
            op = Operation(operation: "CreateRect") { width: 2, height: $1.0 / 2.0$ }
            out = OutputInterface(interface: "out");
            in -> op -> out;
            "#,
        )
        .expect("reads");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edges().len(), 2);
        let op = graph.node_id("op").expect("op");
        assert_eq!(
            graph.node_parameter(op, "width").ok().and_then(Parameter::as_value),
            Some(&Value::Float(2.0))
        );
        assert!(graph
            .node_parameter(op, "height")
            .map(Parameter::is_expression)
            .unwrap_or(false));
    }

    #[test]
    fn operation_names_work_as_node_types() {
        let graph = read_graph("box = CreateBox { xSize: 2.0 };").expect("reads");
        let node = graph.node_by_name("box").expect("box");
        assert_eq!(node.category(), NodeCategory::Operation);
        assert_eq!(
            node.behavior().construction_arguments(),
            vec![("operation".to_string(), Value::from("CreateBox"))]
        );
    }

    #[test]
    fn explicit_interfaces_are_read_from_endpoints() {
        let graph = read_graph(
            r#"
            src = InputInterface(interface: "shapes");
            move = Translate { x: 1.0 }
            sink = OutputInterface(interface: "moved");
            src>shapes -> in<move>out -> moved<sink;
            "#,
        )
        .expect("reads");
        let edges = graph.edges();
        assert_eq!(edges[0].out_interface.as_deref(), Some("shapes"));
        assert_eq!(edges[0].in_interface.as_deref(), Some("in"));
        assert_eq!(edges[1].out_interface.as_deref(), Some("out"));
        assert_eq!(edges[1].in_interface.as_deref(), Some("moved"));
    }

    #[test]
    fn vector_and_plane_values_parse() {
        let graph = read_graph(
            "p = Parameter { offset: Vector3(1, 2.5, -3), cut: Plane(0, 0, 1, 0, 0, 1) }",
        )
        .expect("reads");
        let p = graph.node_id("p").expect("p");
        assert_eq!(
            graph.node_parameter(p, "offset").ok().and_then(Parameter::as_value),
            Some(&Value::Vector3(Vec3::new(1.0, 2.5, -3.0)))
        );
        let cut = graph
            .node_parameter(p, "cut")
            .ok()
            .and_then(Parameter::as_value)
            .and_then(|v| v.as_plane().ok())
            .expect("plane");
        assert_eq!(cut.normal(), Vec3::Z);
        assert_eq!(cut.distance_to_origin(), 1.0);
    }

    #[test]
    fn errors_carry_offsets_and_kinds() {
        let err = read_graph("a = Parameter;\na -> b;").expect_err("unknown node");
        assert!(matches!(err, Error::Parse(ref e) if e.offset() == 20));

        let err = read_graph("a = Teleport;").expect_err("unknown type");
        assert!(matches!(err, Error::UnknownNodeType { .. }));

        let err = read_graph("a = Parameter; a = Parameter;").expect_err("duplicate");
        assert!(matches!(err, Error::Parse(_)));

        let err = read_graph("op = Operation;").expect_err("missing operation");
        assert!(matches!(err, Error::MissingArgument { .. }));

        let err = read_graph("a = Parameter { x: }").expect_err("missing value");
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn empty_input_gives_an_empty_graph() {
        let graph = read_graph("  // nothing here\n").expect("reads");
        assert!(graph.is_empty());
    }
}
