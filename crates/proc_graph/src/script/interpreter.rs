//! Tree-walking interpreter over a [`ScopeStack`].
//!
//! Evaluation is strictly left to right and `and`/`or` short-circuit. Output
//! from `print` goes to the [`OutputSink`] handed to the interpreter; the
//! value of the last expression statement is kept for single-expression
//! parameter bindings.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{Error, Result};
use crate::script::ast::{Expr, Literal, LogicalOp, Program, Stmt};
use crate::script::builtins;
use crate::script::parser::parse;
use crate::script::scope::{Scope, ScopeStack};
use crate::script::sink::{OutputSink, TracingSink};
use crate::value::{ops, CallEnv, Callable, ScriptFunction, Value};

/// Configuration for an [`Interpreter`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Seed for the `random` builtin.
    pub seed: u64,
    /// Maximum nesting of callable invocations.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_call_depth: 256,
        }
    }
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 {
            return Err(Error::InvalidConfig("max_call_depth must be > 0".into()));
        }
        Ok(())
    }
}

enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    scopes: ScopeStack,
    external_depths: Vec<usize>,
    sink: Box<dyn OutputSink>,
    rng: StdRng,
    last_value: Option<Value>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut scopes = ScopeStack::new();
        builtins::install(&mut scopes);
        Self {
            scopes,
            external_depths: Vec::new(),
            sink: Box::new(TracingSink),
            rng: StdRng::seed_from_u64(config.seed),
            last_value: None,
            call_depth: 0,
            max_call_depth: config.max_call_depth.max(1),
        }
    }

    /// Replaces the output sink.
    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Box<dyn OutputSink>) {
        self.sink = sink;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth.max(1);
    }

    pub fn declare_global(&mut self, name: &str, value: impl Into<Value>) {
        self.scopes.declare_global(name, value.into());
    }

    /// Looks a symbol up through all live scopes.
    pub fn symbol(&self, name: &str) -> Option<Value> {
        self.scopes.lookup(name)
    }

    /// Value of the last executed expression statement.
    pub fn last_evaluated_expression(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    /// Pushes a scope of externally provided symbols, such as node
    /// parameters. Dotted names like `node.width` are matched as whole paths.
    pub fn push_external_symbols<I, K>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let scope: Scope = symbols.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.external_depths.push(self.scopes.depth());
        self.scopes.push(scope);
    }

    /// Pops the most recently pushed external scope.
    pub fn pop_external_symbols(&mut self) -> Option<Scope> {
        let depth = self.external_depths.pop()?;
        let mut popped = None;
        while self.scopes.depth() > depth {
            popped = self.scopes.pop();
        }
        popped
    }

    /// Parses and runs `source`, returning the last evaluated expression.
    pub fn run(&mut self, source: &str) -> Result<Option<Value>> {
        let program = parse(source)?;
        self.interpret(&program)?;
        Ok(self.last_value.clone())
    }

    pub fn interpret(&mut self, program: &Program) -> Result<()> {
        self.last_value = None;
        for stmt in program.statements() {
            if let Flow::Return(value) = self.execute(stmt)? {
                self.last_value = Some(value);
                break;
            }
        }
        Ok(())
    }

    /// Invokes a callable value with already evaluated arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        let callable = match callee {
            Value::Callable(c) => c.clone(),
            other => {
                return Err(Error::Evaluation(format!(
                    "value of type {} is not callable",
                    other.type_name()
                )))
            }
        };
        if self.call_depth >= self.max_call_depth {
            return Err(Error::Evaluation(format!(
                "maximum call depth {} exceeded in '{}'",
                self.max_call_depth,
                callable.name()
            )));
        }
        self.call_depth += 1;
        let result = callable.invoke(self, args);
        self.call_depth -= 1;
        result
    }

    fn in_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let depth = self.scopes.depth();
        self.scopes.push(Scope::new());
        let result = f(self);
        while self.scopes.depth() > depth {
            self.scopes.pop();
        }
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(v) = self.execute(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                self.last_value = Some(value);
            }
            Stmt::Var { name, init } => {
                let value = match init {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                self.scopes.declare(name, value);
            }
            Stmt::Block(statements) => {
                return self.in_scope(|this| this.execute_all(statements));
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_true() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_true() {
                    if let Flow::Return(v) = self.execute(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
            }
            Stmt::Function(decl) => {
                let function = ScriptFunction {
                    decl: decl.clone(),
                    closure: self.scopes.capture(),
                };
                self.scopes
                    .declare(&decl.name, Value::Callable(Callable::script(function)));
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Integer(i) => Value::Integer(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Variable(name) => self.scopes.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.scopes.assign(name, value.clone());
                Ok(value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                ops::binary(*op, &lhs, &rhs)
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?.is_true();
                let result = match op {
                    LogicalOp::Or if lhs => true,
                    LogicalOp::And if !lhs => false,
                    _ => self.evaluate(rhs)?.is_true(),
                };
                Ok(Value::Boolean(result))
            }
            Expr::Unary { op, operand } => {
                let operand = self.evaluate(operand)?;
                ops::unary(*op, &operand)
            }
            Expr::Call { callee, args } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.call(&callee, values)
            }
            Expr::Get { object, name } => {
                if let Some(value) = expr.dotted_path().and_then(|p| self.scopes.lookup(&p)) {
                    return Ok(value);
                }
                self.evaluate(object)?.member(name)
            }
        }
    }
}

impl CallEnv for Interpreter {
    fn write_output(&mut self, text: &str) {
        self.sink.write_line(text);
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn call_script(&mut self, function: &ScriptFunction, args: Vec<Value>) -> Result<Value> {
        let saved = self.scopes.replace(function.closure.clone());
        let frame: Scope = function
            .decl
            .params
            .iter()
            .cloned()
            .zip(args)
            .collect();
        self.scopes.push(frame);
        let result = self.execute_all(&function.decl.body);
        self.scopes.replace(saved);
        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
