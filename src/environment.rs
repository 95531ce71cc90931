//! Lexical scope chain.
//!
//! Each [`Environment`] holds the bindings of one block and a shared handle
//! to the block that statically encloses it.  The chain is rooted at the
//! global environment, which has no enclosing scope.
//!
//! Two ways in:
//!
//! * by **name** (`get` / `assign`) – walk outward until the first scope
//!   that binds the name;
//! * by **distance** (`get_at` / `assign_at`) – hop exactly `d` links via
//!   [`Environment::ancestor`] and touch only that scope's own map.

use crate::error::{Result, SlugError};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// The statically enclosing scope, `None` for the globals.
    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in *this* scope, replacing any previous local binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Whether this scope (not its ancestors) binds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Dynamic lookup: innermost binding of `name` along the chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(SlugError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Dynamic assignment: overwrite the innermost binding of `name`.
    ///
    /// A name bound nowhere in the chain becomes a new global.
    pub fn assign(&mut self, name: &str, value: Value) {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value);
        } else {
            debug!("Creating global '{}' on first assignment", name);
            self.values.insert(name.to_string(), value);
        }
    }

    /// The environment exactly `distance` links outward from `env`.
    ///
    /// Fails with [`SlugError::Internal`] if the chain ends first.
    pub fn ancestor(env: &EnvRef, distance: usize, line: usize) -> Result<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for hop in 0..distance {
            let next: Option<EnvRef> = current.borrow().enclosing();

            current = next.ok_or_else(|| {
                SlugError::internal(
                    Some(line),
                    format!(
                        "scope chain ended after {} of {} hops",
                        hop, distance
                    ),
                )
            })?;
        }

        Ok(current)
    }

    /// Resolved lookup: read `name` from the scope `distance` links out.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let scope: EnvRef = Self::ancestor(env, distance, line)?;
        let value: Option<Value> = scope.borrow().values.get(name).cloned();

        value.ok_or_else(|| {
            SlugError::runtime(line, format!("Undefined variable '{}'.", name))
        })
    }

    /// Resolved assignment: write `name` into the scope `distance` links out.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope: EnvRef = Self::ancestor(env, distance, line)?;

        scope.borrow_mut().define(name, value);

        Ok(())
    }
}
