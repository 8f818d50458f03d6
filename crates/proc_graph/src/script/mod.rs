//! Embedded scripting language used for parameter expressions.
//!
//! Source text is tokenized by [`lexer`], parsed into an [`ast::Program`] by
//! [`parser`], and run by the tree-walking [`Interpreter`].
pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod sink;

pub use ast::Program;
pub use interpreter::{Interpreter, InterpreterConfig};
pub use parser::{parse, ParseError};
pub use scope::{Scope, ScopeStack, SharedScope};
pub use sink::{BufferSink, FnOutputSink, OutputSink, TracingSink};
