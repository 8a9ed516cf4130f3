//! Lexical environments: a chain of frames, each a map from symbol to value.
//!
//! The first frame is the innermost scope. `define_global` always writes into
//! the outermost frame (the one with no parent), which is the "repl" frame
//! created at boot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::LispError;
use crate::value::Value;

#[derive(Debug)]
struct EnvNode {
    frame: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

#[derive(Clone, Debug)]
pub struct Environment(Rc<EnvNode>);

impl Environment {
    /// A single, empty frame with no parent.
    pub fn new_root() -> Environment {
        Environment(Rc::new(EnvNode {
            frame: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A new innermost frame extending `self`, per `extend(env, bindings)`.
    pub fn extend(&self, bindings: impl IntoIterator<Item = (String, Value)>) -> Environment {
        Environment(Rc::new(EnvNode {
            frame: RefCell::new(bindings.into_iter().collect()),
            parent: Some(self.clone()),
        }))
    }

    /// Looks up `sym` starting from the innermost frame.
    pub fn lookup(&self, sym: &str) -> Option<Value> {
        let mut node = &self.0;
        loop {
            if let Some(v) = node.frame.borrow().get(sym) {
                return Some(v.clone());
            }
            match &node.parent {
                Some(parent) => node = &parent.0,
                None => return None,
            }
        }
    }

    /// Binds `sym` in the innermost frame of `self` (used for parameter
    /// binding when a function is applied).
    pub fn define_here(&self, sym: impl Into<String>, val: Value) {
        self.0.frame.borrow_mut().insert(sym.into(), val);
    }

    /// Binds `sym` in the outermost frame, per `define_global`.
    pub fn define_global(&self, sym: impl Into<String>, val: Value) {
        let mut node = &self.0;
        while let Some(parent) = &node.parent {
            node = &parent.0;
        }
        node.frame.borrow_mut().insert(sym.into(), val);
    }

    /// Finds the innermost frame defining `sym` and writes `val` there, per
    /// `assign(env, sym, val)`. Errors if no frame defines `sym`.
    pub fn assign(&self, sym: &str, val: Value) -> Result<(), LispError> {
        let mut node = &self.0;
        loop {
            if node.frame.borrow().contains_key(sym) {
                node.frame.borrow_mut().insert(sym.to_string(), val);
                return Ok(());
            }
            match &node.parent {
                Some(parent) => node = &parent.0,
                None => {
                    return Err(LispError::eval_msg(format!("symbol {} not found", sym)));
                }
            }
        }
    }

    pub fn is_defined(&self, sym: &str) -> bool {
        self.lookup(sym).is_some()
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The outermost frame, reached by walking the parent chain. Builtins
    /// that need "the" environment (`eval`, `defined?`, `env-get`) always
    /// consult this frame rather than a caller's lexical scope.
    pub fn global(&self) -> Environment {
        let mut node = &self.0;
        while let Some(parent) = &node.parent {
            node = &parent.0;
        }
        Environment(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parent_chain() {
        let root = Environment::new_root();
        root.define_global("x", Value::Int(1));
        let child = root.extend([("y".to_string(), Value::Int(2))]);
        assert_eq!(child.lookup("x").unwrap().as_int(), Some(1));
        assert_eq!(child.lookup("y").unwrap().as_int(), Some(2));
        assert!(child.lookup("z").is_none());
    }

    #[test]
    fn define_global_always_writes_outermost_frame() {
        let root = Environment::new_root();
        let child = root.extend([("x".to_string(), Value::Int(1))]);
        child.define_global("x", Value::Int(99));
        // the inner frame's binding is untouched; lookup still finds it first
        assert_eq!(child.lookup("x").unwrap().as_int(), Some(1));
        assert_eq!(root.lookup("x").unwrap().as_int(), Some(99));
    }

    #[test]
    fn assign_writes_defining_frame_not_innermost() {
        let root = Environment::new_root();
        root.define_global("x", Value::Int(1));
        let child = root.extend([]);
        child.assign("x", Value::Int(2)).unwrap();
        assert_eq!(root.lookup("x").unwrap().as_int(), Some(2));
    }

    #[test]
    fn assign_errors_on_undefined_symbol() {
        let root = Environment::new_root();
        assert!(root.assign("nope", Value::Nil).is_err());
    }

    #[test]
    fn shared_frame_is_visible_to_every_closure_holding_it() {
        let root = Environment::new_root();
        let shared = root.extend([("x".to_string(), Value::Int(1))]);
        let closure_a = shared.clone();
        let closure_b = shared.clone();
        closure_a.assign("x", Value::Int(7)).unwrap();
        assert_eq!(closure_b.lookup("x").unwrap().as_int(), Some(7));
    }
}
