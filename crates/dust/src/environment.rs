//! Lexically nested name→[`Symbol`] bindings with a parent chain.
//!
//! Mirrors the reference interpreter's `Environment`: `define`/`lookup`/
//! `assign`/`get`/`ref` operate on the local scope first, then walk `parent`.
//! A fresh [`EnvRef`] for a new scope always carries a link to the scope it
//! was opened from; the root environment (no parent) is pre-populated with
//! builtins by [`Environment::root`].

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::{RunError, RunErrorKind};
use crate::value::{Builtin, Kind, Symbol, Value};

pub type EnvRef = Rc<RefCell<Environment>>;
pub type SymbolRef = Rc<RefCell<Symbol>>;

#[derive(Debug)]
pub struct Environment {
    bindings: AHashMap<String, SymbolRef>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// Builds the root environment, pre-populated with `print`, `len`, and
    /// `type` as immutable `function`-kind symbols.
    pub fn root() -> EnvRef {
        let env = Rc::new(RefCell::new(Self { bindings: AHashMap::new(), parent: None }));
        for builtin in Builtin::ALL {
            let symbol = Symbol::immutable(Value::Builtin(builtin), Kind::Function);
            env.borrow_mut().bindings.insert(builtin.to_string(), Rc::new(RefCell::new(symbol)));
        }
        env
    }

    /// Opens a fresh child scope linked to `parent`.
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self { bindings: AHashMap::new(), parent: Some(Rc::clone(parent)) }))
    }

    /// Inserts `symbol` into the local scope under `name`.
    ///
    /// Fails with [`RunErrorKind::Redefinition`] if `name` is already bound
    /// in this exact scope and `redefine` is `false`; names shadowed from an
    /// enclosing scope are unaffected.
    pub fn define(&mut self, name: &str, symbol: Symbol, redefine: bool, line: Option<u32>) -> Result<(), RunError> {
        if !redefine && self.bindings.contains_key(name) {
            return Err(RunError::new(
                RunErrorKind::Redefinition,
                format!("'{name}' is already defined in this scope"),
                line,
            ));
        }
        self.bindings.insert(name.to_string(), Rc::new(RefCell::new(symbol)));
        Ok(())
    }

    /// Returns the nearest scope (walking the parent chain) in which `name`
    /// is bound, or `None`.
    pub fn lookup(env: &EnvRef, name: &str) -> Option<SymbolRef> {
        let mut current = Rc::clone(env);
        loop {
            let next = {
                let borrowed = current.borrow();
                if let Some(symbol) = borrowed.bindings.get(name) {
                    return Some(Rc::clone(symbol));
                }
                borrowed.parent.clone()
            };
            current = next?;
        }
    }

    /// Locates `name` in the scope chain and overwrites its value.
    ///
    /// Fails [`RunErrorKind::Immutable`] if found but not mutable, and
    /// [`RunErrorKind::Undefined`] if not found anywhere in the chain.
    pub fn assign(env: &EnvRef, name: &str, value: Value, line: Option<u32>) -> Result<(), RunError> {
        match Self::lookup(env, name) {
            Some(symbol) => {
                let mut symbol = symbol.borrow_mut();
                if !symbol.is_mutable {
                    return Err(RunError::new(RunErrorKind::Immutable, format!("'{name}' is immutable"), line));
                }
                symbol.kind = value.kind();
                symbol.value = value;
                Ok(())
            }
            None => Err(RunError::new(RunErrorKind::Undefined, format!("undefined variable '{name}'"), line)),
        }
    }

    /// Returns the bound value, or `RunErrorKind::Undefined` if unbound.
    pub fn get(env: &EnvRef, name: &str, line: Option<u32>) -> Result<Value, RunError> {
        Self::lookup(env, name)
            .map(|symbol| symbol.borrow().value.clone())
            .ok_or_else(|| RunError::new(RunErrorKind::Undefined, format!("undefined variable '{name}'"), line))
    }

    /// Returns the bound `Symbol` handle, or a fresh null sentinel if
    /// `name` is unbound anywhere in the chain.
    pub fn resolve(env: &EnvRef, name: &str) -> SymbolRef {
        Self::lookup(env, name).unwrap_or_else(|| Rc::new(RefCell::new(Symbol::null_sentinel())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parent_chain() {
        let root = Environment::root();
        root.borrow_mut().define("x", Symbol::new(Value::Int(1)), false, None).unwrap();
        let child = Environment::child(&root);
        assert_eq!(Environment::get(&child, "x", None).unwrap().kind(), crate::value::Kind::Int);
    }

    #[test]
    fn redefine_without_flag_fails() {
        let root = Environment::root();
        root.borrow_mut().define("x", Symbol::new(Value::Int(1)), false, None).unwrap();
        let err = root.borrow_mut().define("x", Symbol::new(Value::Int(2)), false, None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::Redefinition);
    }

    #[test]
    fn assign_to_immutable_fails() {
        let root = Environment::root();
        root.borrow_mut()
            .define("f", Symbol::immutable(Value::Int(1), Kind::Function), false, None)
            .unwrap();
        let err = Environment::assign(&root, "f", Value::Int(2), None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::Immutable);
    }

    #[test]
    fn assign_to_undefined_fails() {
        let root = Environment::root();
        let err = Environment::assign(&root, "missing", Value::Int(1), None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::Undefined);
    }

    #[test]
    fn child_scope_shadows_without_mutating_parent() {
        let root = Environment::root();
        root.borrow_mut().define("x", Symbol::new(Value::Int(1)), false, None).unwrap();
        let child = Environment::child(&root);
        child.borrow_mut().define("x", Symbol::new(Value::Int(2)), false, None).unwrap();
        assert_eq!(Environment::get(&child, "x", None).unwrap().kind(), Kind::Int);
        if let Value::Int(n) = Environment::get(&root, "x", None).unwrap() {
            assert_eq!(n, 1);
        } else {
            panic!("expected int");
        }
    }

    #[test]
    fn resolve_returns_null_sentinel_for_unbound_name() {
        let root = Environment::root();
        let symbol = Environment::resolve(&root, "missing");
        assert!(matches!(symbol.borrow().value, Value::Null));
        assert_eq!(symbol.borrow().kind, Kind::Null);
    }

    #[test]
    fn resolve_returns_the_bound_symbol() {
        let root = Environment::root();
        root.borrow_mut().define("x", Symbol::new(Value::Int(5)), false, None).unwrap();
        let symbol = Environment::resolve(&root, "x");
        assert!(matches!(symbol.borrow().value, Value::Int(5)));
    }

    #[test]
    fn root_has_builtins_bound() {
        let root = Environment::root();
        assert!(Environment::get(&root, "print", None).unwrap().is_callable());
        assert!(Environment::get(&root, "len", None).unwrap().is_callable());
        assert!(Environment::get(&root, "type", None).unwrap().is_callable());
    }
}
