//! Text format for graphs.
//!
//! ```text
//! in = InputInterface(interface: "in");
//! op = Operation(operation: "CreateRect") { height: 1.000000, width: $base * 2.0$ }
//! out = OutputInterface(interface: "out");
//! in -> op;
//! op -> out;
//! ```
pub mod lexer;
pub mod reader;
pub mod writer;

pub use reader::{read_graph, read_into};
pub use writer::{write_graph, write_parameter, write_value};
