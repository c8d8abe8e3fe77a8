//! Lexically-scoped environment: a name->Value mapping with a parent chain.
//!
//! Environments are reference-counted and shared: a `Function` captures its
//! defining `Environment` by cloning the handle, so closures observe later
//! mutations made through any other alias of the same scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, VmError};
use crate::value::Value;

#[derive(Debug, PartialEq)]
struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// A shared handle to a lexical scope. Cloning an `Environment` aliases the
/// same scope; it does not create a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    pub fn new(parent: Option<Environment>) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent,
        })))
    }

    pub fn root() -> Self {
        Self::new(None)
    }

    /// Unconditional insert into this scope; shadows an outer binding of
    /// the same name without disturbing it.
    pub fn declare(&self, name: &str, value: Value) {
        self.0.borrow_mut().vars.insert(name.to_string(), value);
    }

    /// Write into the nearest scope (starting here) that already owns
    /// `name`. Fails with `UnboundName` if no scope in the chain has it.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut scope = self.0.borrow_mut();
        if scope.vars.contains_key(name) {
            scope.vars.insert(name.to_string(), value);
            return Ok(());
        }
        match &scope.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(VmError::unbound_name(name)),
        }
    }

    /// Read from the nearest scope (starting here) that owns `name`.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        let scope = self.0.borrow();
        if let Some(v) = scope.vars.get(name) {
            return Ok(v.clone());
        }
        match &scope.parent {
            Some(parent) => parent.lookup(name),
            None => Err(VmError::unbound_name(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let scope = self.0.borrow();
        if scope.vars.contains_key(name) {
            return true;
        }
        match &scope.parent {
            Some(parent) => parent.contains(name),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_shadows_within_one_scope() {
        let env = Environment::root();
        env.declare("x", Value::Int(1));
        env.declare("x", Value::Int(2));
        assert_eq!(env.lookup("x").unwrap(), Value::Int(2));
    }

    #[test]
    fn assign_walks_up_to_owning_scope() {
        let parent = Environment::root();
        parent.declare("x", Value::Int(1));
        let child = Environment::new(Some(parent.clone()));
        child.assign("x", Value::Int(9)).unwrap();
        assert_eq!(parent.lookup("x").unwrap(), Value::Int(9));
    }

    #[test]
    fn assign_to_undeclared_name_is_unbound() {
        let env = Environment::root();
        assert!(matches!(
            env.assign("missing", Value::Null),
            Err(VmError::UnboundName(_))
        ));
    }

    #[test]
    fn child_scope_is_invisible_after_it_goes_out_of_scope() {
        let parent = Environment::root();
        {
            let child = Environment::new(Some(parent.clone()));
            child.declare("local_only", Value::Bool(true));
            assert!(child.contains("local_only"));
        }
        assert!(!parent.contains("local_only"));
    }
}
