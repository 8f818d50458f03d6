//! Parameter expressions and their resolution through the context tree.
//!
//! An [`Expression`] is parsed once and re-evaluated on every read. Its free
//! variables are bound from the owning context chain before evaluation; see
//! [`ParameterResolver`].
use std::collections::HashSet;
use std::fmt;

use crate::context::{ContextArena, ContextId, Parameter};
use crate::error::{Error, Result};
use crate::script::ast::{Expr, Program, Stmt};
use crate::script::builtins::is_builtin;
use crate::script::{parse, Interpreter};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    program: Program,
    variables: Vec<String>,
}

impl Expression {
    /// Parses an expression. A missing trailing `;` is added.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let program = if trimmed.ends_with(';') || trimmed.ends_with('}') {
            parse(trimmed)?
        } else {
            parse(&format!("{};", trimmed))?
        };
        let variables = FreeVariables::collect(&program);
        Ok(Self {
            source: trimmed.to_owned(),
            program,
            variables,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Free variables in order of first use. Dotted references such as
    /// `node.width` are reported as whole paths.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates against already resolved bindings, returning the value of
    /// the last expression statement or `Null`.
    pub fn evaluate<I, K>(&self, interpreter: &mut Interpreter, bindings: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        interpreter.push_external_symbols(bindings);
        let result = interpreter.interpret(&self.program);
        let value = interpreter.last_evaluated_expression().cloned();
        interpreter.pop_external_symbols();
        result?;
        Ok(value.unwrap_or_default())
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Scoped walk collecting names used before any local declaration.
struct FreeVariables {
    scopes: Vec<HashSet<String>>,
    found: Vec<String>,
}

impl FreeVariables {
    fn collect(program: &Program) -> Vec<String> {
        let mut walker = Self {
            scopes: vec![HashSet::new()],
            found: Vec::new(),
        };
        for stmt in program.statements() {
            walker.stmt(stmt);
        }
        walker.found
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains(name))
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned());
        }
    }

    fn record(&mut self, root: &str, path: String) {
        if self.is_local(root) || is_builtin(root) {
            return;
        }
        if !self.found.contains(&path) {
            self.found.push(path);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(e) => self.expr(e),
            Stmt::Var { name, init } => {
                if let Some(init) = init {
                    self.expr(init);
                }
                self.declare(name);
            }
            Stmt::Block(statements) => {
                self.scopes.push(HashSet::new());
                for s in statements {
                    self.stmt(s);
                }
                self.scopes.pop();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(condition);
                self.stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.expr(condition);
                self.stmt(body);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.scopes.push(decl.params.iter().cloned().collect());
                for s in &decl.body {
                    self.stmt(s);
                }
                self.scopes.pop();
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable(name) => self.record(name, name.clone()),
            Expr::Assign { name, value } => {
                self.expr(value);
                if !self.is_local(name) {
                    self.declare(name);
                }
            }
            Expr::Binary { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::Get { object, .. } => match expr.dotted_path() {
                Some(path) => {
                    let root = path.split('.').next().unwrap_or_default().to_owned();
                    self.record(&root, path);
                }
                None => self.expr(object),
            },
        }
    }
}

/// Reads parameters, evaluating expressions against the context tree.
///
/// A free variable `a.b` used by an expression owned by context `C` is looked
/// up in `C`, then in each ancestor of `C`. Within one context the full path
/// is tried first, then successively shorter prefixes, so `pos.x` binds `pos`
/// when `pos` is a `Vector3` parameter. Expression-valued parameters are
/// evaluated recursively, up to `max_depth` levels.
pub struct ParameterResolver<'a> {
    contexts: &'a ContextArena,
    interpreter: &'a mut Interpreter,
    max_depth: usize,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(contexts: &'a ContextArena, interpreter: &'a mut Interpreter, max_depth: usize) -> Self {
        Self {
            contexts,
            interpreter,
            max_depth,
        }
    }

    /// Current value of the parameter `name` at `context`.
    pub fn value_of(&mut self, context: ContextId, name: &str) -> Result<Value> {
        let contexts = self.contexts;
        let parameter = contexts.get_parameter(context, name)?;
        self.resolve(context, parameter, 0)
    }

    /// Current value of an already fetched parameter owned by `owner`.
    pub fn resolve(&mut self, owner: ContextId, parameter: &Parameter, depth: usize) -> Result<Value> {
        match parameter {
            Parameter::Value(v) => Ok(v.clone()),
            Parameter::Expression(e) => self.evaluate(owner, e, depth),
        }
    }

    pub fn evaluate(&mut self, owner: ContextId, expression: &Expression, depth: usize) -> Result<Value> {
        if depth >= self.max_depth {
            return Err(Error::Evaluation(format!(
                "expression '{}' nests deeper than {} levels",
                expression.source(),
                self.max_depth
            )));
        }
        let mut bindings = Vec::with_capacity(expression.variables().len());
        for variable in expression.variables() {
            let (key, found_in, parameter) = self.lookup(owner, variable)?;
            let value = self.resolve(found_in, parameter, depth + 1)?;
            bindings.push((key, value));
        }
        expression.evaluate(self.interpreter, bindings)
    }

    fn lookup(&self, owner: ContextId, path: &str) -> Result<(String, ContextId, &'a Parameter)> {
        let contexts = self.contexts;
        for context in contexts.ancestry(owner) {
            let mut prefix = path;
            loop {
                if let Ok(parameter) = contexts.resolve_variable(context, prefix) {
                    return Ok((prefix.to_owned(), context, parameter));
                }
                match prefix.rfind('.') {
                    Some(dot) => prefix = &prefix[..dot],
                    None => break,
                }
            }
        }
        contexts.resolve_variable(owner, path).map(|p| (path.to_owned(), owner, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expression {
        Expression::parse(source).expect("expression parses")
    }

    #[test]
    fn trailing_semicolon_is_optional() {
        let mut interpreter = Interpreter::new();
        let a = expr("1 + 2").evaluate(&mut interpreter, Vec::<(String, Value)>::new());
        let b = expr("1 + 2;").evaluate(&mut interpreter, Vec::<(String, Value)>::new());
        assert_eq!(a.expect("evaluates"), Value::Integer(3));
        assert_eq!(b.expect("evaluates"), Value::Integer(3));
    }

    #[test]
    fn free_variables_exclude_locals_and_builtins() {
        let e = expr("var k = 2; max(k * width, node.height) + sqrt(offset);");
        assert_eq!(e.variables(), &["width", "node.height", "offset"]);
    }

    #[test]
    fn function_parameters_are_not_free() {
        let e = expr("function f(x) { return x * scale; } f(1.0);");
        assert_eq!(e.variables(), &["scale"]);
    }

    #[test]
    fn evaluation_pops_bindings_on_error() {
        let mut interpreter = Interpreter::new();
        let e = expr("a + true");
        let err = e
            .evaluate(&mut interpreter, [("a", Value::Float(1.0))])
            .expect_err("Float + Boolean is undefined");
        assert!(matches!(err, Error::UndefinedOperator { .. }));
        assert!(interpreter.symbol("a").is_none());
    }

    #[test]
    fn resolver_walks_ancestors_and_nested_expressions() {
        let mut contexts = ContextArena::new();
        let graph = contexts.create("graph");
        let node = contexts.create("node");
        contexts.set_parent(node, Some(graph)).expect("attach");
        contexts
            .create_parameter(graph, "base", Value::Float(2.0))
            .expect("create");
        contexts
            .create_parameter(node, "double", expr("base * 2.0"))
            .expect("create");
        contexts
            .create_parameter(node, "width", expr("double + 1.0"))
            .expect("create");

        let mut interpreter = Interpreter::new();
        let mut resolver = ParameterResolver::new(&contexts, &mut interpreter, 8);
        let v = resolver.value_of(node, "width").expect("resolves");
        assert_eq!(v, Value::Float(5.0));
    }

    #[test]
    fn resolver_binds_dotted_paths_and_prefixes() {
        let mut contexts = ContextArena::new();
        let root = contexts.create("root");
        let other = contexts.create("other");
        contexts.set_parent(other, Some(root)).expect("attach");
        contexts
            .create_parameter(other, "size", Value::Float(3.0))
            .expect("create");
        contexts
            .create_parameter(root, "pos", Value::from(glam::Vec3::new(1.0, 2.0, 3.0)))
            .expect("create");
        contexts
            .create_parameter(root, "sum", expr("other.size + pos.y"))
            .expect("create");

        let mut interpreter = Interpreter::new();
        let mut resolver = ParameterResolver::new(&contexts, &mut interpreter, 8);
        assert_eq!(
            resolver.value_of(root, "sum").expect("resolves"),
            Value::Float(5.0)
        );
    }

    #[test]
    fn self_reference_hits_the_depth_limit() {
        let mut contexts = ContextArena::new();
        let root = contexts.create("root");
        contexts
            .create_parameter(root, "a", expr("a + 1"))
            .expect("create");
        let mut interpreter = Interpreter::new();
        let mut resolver = ParameterResolver::new(&contexts, &mut interpreter, 4);
        let err = resolver.value_of(root, "a").expect_err("self reference");
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[test]
    fn unresolved_variable_names_the_missing_segment() {
        let mut contexts = ContextArena::new();
        let root = contexts.create("root");
        contexts
            .create_parameter(root, "w", expr("missing.value * 2"))
            .expect("create");
        let mut interpreter = Interpreter::new();
        let mut resolver = ParameterResolver::new(&contexts, &mut interpreter, 4);
        let err = resolver.value_of(root, "w").expect_err("unresolved");
        assert!(matches!(err, Error::NotFound { what: "context", ref name } if name == "missing"));
    }
}
