//! Callable values: native functions, script functions and unset declarations.
//!
//! All three share [`Callable::invoke`], so the interpreter never needs to
//! know which flavour it is calling.
use std::fmt;
use std::sync::Arc;

use rand::RngCore;

use crate::error::{Error, Result};
use crate::script::ast::FunctionDecl;
use crate::script::scope::SharedScope;
use crate::value::Value;

/// Services a callable may need from whoever invokes it.
pub trait CallEnv {
    /// Writes a line of script output.
    fn write_output(&mut self, text: &str);

    /// Random source for builtins such as `random`.
    fn rng(&mut self) -> &mut dyn RngCore;

    /// Runs a script-defined function body.
    fn call_script(&mut self, function: &ScriptFunction, args: Vec<Value>) -> Result<Value>;
}

pub type NativeFn = Arc<dyn Fn(&mut dyn CallEnv, &[Value]) -> Result<Value> + Send + Sync>;

/// A function declared in script, closing over the scopes live at its
/// definition.
#[derive(Clone)]
pub struct ScriptFunction {
    pub decl: Arc<FunctionDecl>,
    pub closure: Vec<SharedScope>,
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.decl.name)
            .field("closure_depth", &self.closure.len())
            .finish()
    }
}

#[derive(Clone)]
enum Body {
    Native(NativeFn),
    Script(ScriptFunction),
}

/// A callable value. `arity` of `None` accepts any argument count.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    arity: Option<usize>,
    body: Option<Body>,
}

impl Callable {
    pub fn native<F>(name: &str, arity: Option<usize>, f: F) -> Self
    where
        F: Fn(&mut dyn CallEnv, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            body: Some(Body::Native(Arc::new(f))),
        }
    }

    pub fn script(function: ScriptFunction) -> Self {
        Self {
            name: function.decl.name.as_str().into(),
            arity: Some(function.decl.params.len()),
            body: Some(Body::Script(function)),
        }
    }

    /// A declared callable whose body has not been provided yet.
    pub fn unset(name: &str, arity: Option<usize>) -> Self {
        Self {
            name: name.into(),
            arity,
            body: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn is_set(&self) -> bool {
        self.body.is_some()
    }

    /// Installs a native body, keeping name and arity.
    pub fn set_native<F>(&mut self, f: F)
    where
        F: Fn(&mut dyn CallEnv, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.body = Some(Body::Native(Arc::new(f)));
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (&self.body, &other.body) {
            (Some(Body::Native(a)), Some(Body::Native(b))) => Arc::ptr_eq(a, b),
            (Some(Body::Script(a)), Some(Body::Script(b))) => Arc::ptr_eq(&a.decl, &b.decl),
            (None, None) => Arc::ptr_eq(&self.name, &other.name),
            _ => false,
        }
    }

    pub fn invoke(&self, env: &mut dyn CallEnv, args: Vec<Value>) -> Result<Value> {
        if let Some(arity) = self.arity {
            if args.len() != arity {
                return Err(Error::Evaluation(format!(
                    "callable '{}' expects {} argument(s) but got {}",
                    self.name,
                    arity,
                    args.len()
                )));
            }
        }
        match &self.body {
            None => Err(Error::UnsetCallable {
                name: self.name.to_string(),
            }),
            Some(Body::Native(f)) => f(env, &args),
            Some(Body::Script(function)) => env.call_script(function, args),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            None => "unset",
            Some(Body::Native(_)) => "native",
            Some(Body::Script(_)) => "script",
        };
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("body", &body)
            .finish()
    }
}
