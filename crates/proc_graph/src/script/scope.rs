//! Stack of symbol scopes used by the interpreter.
//!
//! Each scope is a shared frame, so a script function can capture the frames
//! live at its definition and keep them alive after the stack unwinds.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::script::builtins::is_builtin;
use crate::value::Value;

pub type Scope = HashMap<String, Value>;

/// A scope that may be referenced from both the stack and closures.
pub type SharedScope = Arc<Mutex<Scope>>;

fn lock(scope: &SharedScope) -> MutexGuard<'_, Scope> {
    scope.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot(scope: &SharedScope) -> Scope {
    lock(scope).clone()
}

/// Innermost scope is last. Index 0 holds globals and is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<SharedScope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![SharedScope::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(Arc::new(Mutex::new(scope)));
    }

    /// Pops the innermost scope. If a closure still holds it, the returned
    /// map is a snapshot.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() <= 1 {
            return None;
        }
        let shared = self.scopes.pop()?;
        Some(match Arc::try_unwrap(shared) {
            Ok(scope) => scope.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => snapshot(&shared),
        })
    }

    /// The frames currently live, shared with the stack.
    pub fn capture(&self) -> Vec<SharedScope> {
        self.scopes.clone()
    }

    /// Swaps in `frames` as the live stack and returns the previous one.
    pub fn replace(&mut self, frames: Vec<SharedScope>) -> Vec<SharedScope> {
        if frames.is_empty() {
            return self.scopes.clone();
        }
        std::mem::replace(&mut self.scopes, frames)
    }

    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last() {
            lock(scope).insert(name.to_owned(), value);
        }
    }

    pub fn declare_global(&mut self, name: &str, value: Value) {
        lock(&self.scopes[0]).insert(name.to_owned(), value);
    }

    /// Assigns to the nearest scope declaring `name`, else declares it in the
    /// innermost scope. Builtins are shadowed rather than overwritten.
    pub fn assign(&mut self, name: &str, value: Value) {
        for (index, scope) in self.scopes.iter().enumerate().rev() {
            let mut scope = lock(scope);
            if let Some(slot) = scope.get_mut(name) {
                if index == 0 && is_builtin(name) {
                    break;
                }
                *slot = value;
                return;
            }
        }
        self.declare(name, value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| lock(scope).get(name).cloned())
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.lookup(name)
            .ok_or_else(|| Error::not_found("symbol", name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
