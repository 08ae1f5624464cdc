//! Lexically-scoped variable bindings, chained by an enclosing pointer.

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// A shared handle to a scope. Cloning an `Environment` aliases the same
/// scope, which is what lets a closure and the call site that later
/// mutates an outer variable observe the same binding.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    pub fn new_global() -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            values: HashMap::new(),
            enclosing: None,
        })))
    }

    pub fn new_enclosed(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            values: HashMap::new(),
            enclosing: Some(parent.clone()),
        })))
    }

    /// Inserts or overwrites a binding in this (innermost) scope. Shadowing
    /// a name from an enclosing scope is allowed.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().values.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        let scope = self.0.borrow();
        if let Some(v) = scope.values.get(&name.lexeme) {
            return Ok(v.clone());
        }
        match &scope.enclosing {
            Some(parent) => parent.get(name),
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }

    /// Mutates an existing binding wherever it is found on the chain.
    /// Never creates a new binding.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut scope = self.0.borrow_mut();
        if scope.values.contains_key(&name.lexeme) {
            scope.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        match &scope.enclosing {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment(..)")
    }
}
