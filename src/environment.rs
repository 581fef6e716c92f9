use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::value::Value;

/// Shared handle to a scope. Closures and references hold long-lived
/// handles to the environment they captured, and mutation through any
/// holder is visible to all of them.
pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// A mutable name→value scope chained to an optional outer scope. The
/// outer link is absent only for the root.
#[derive(Debug, Default)]
pub struct Environment {
    outer: Option<EnvironmentRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            outer: None,
            bindings: IndexMap::new(),
        }))
    }

    pub fn with_outer(outer: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            outer: Some(outer),
            bindings: IndexMap::new(),
        }))
    }

    pub fn get(env: &EnvironmentRef, name: &str) -> Option<Value> {
        if let Some(value) = env.borrow().bindings.get(name) {
            return Some(value.clone());
        }
        let outer = env.borrow().outer.clone();
        match outer {
            Some(outer) => Environment::get(&outer, name),
            None => None,
        }
    }

    /// Binds `name` in this scope, shadowing any outer binding of the same
    /// name. Writing through to another scope happens only via references.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) {
        self.bindings.shift_remove(name);
    }
}
