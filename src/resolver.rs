//! Static resolver pass for slug expressions.
//!
//! The resolver keeps a stack of block scopes that mirrors the environments
//! the interpreter will create (`begin_scope` / `declare` / `end_scope`), and
//! for *each* variable occurrence records how many scopes outward its binding
//! lives.  References bound in no tracked scope are left out of the map and
//! the interpreter treats them as globals.
//!
//! The resulting [`Locals`] map is keyed by [`ExprId`], never by name: two
//! occurrences of `x` may sit at different distances.

use crate::ast::{Expr, ExprId};
use crate::stack;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Reference → scope distance, produced once and then only read.
pub type Locals = HashMap<ExprId, usize>;

#[derive(Debug, Default)]
pub struct Resolver {
    scopes: Vec<HashSet<String>>,
    locals: Locals,
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Self::default()
    }

    /// Enter a block.  Must be paired with [`Resolver::end_scope`].
    #[inline]
    pub fn begin_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    #[inline]
    pub fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope.  No‑op at global level, where
    /// every name is already global.
    pub fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned());
        }
    }

    /// Number of block scopes currently open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Walk `expr` and record a distance for every variable occurrence
    /// bound in an open scope.
    pub fn resolve(&mut self, expr: &Expr<'_>) {
        stack::guarded(|| self.resolve_node(expr))
    }

    fn resolve_node(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve(inner),

            Expr::Variable { id, name } => self.resolve_local(*id, name.lexeme),

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve(value);
                self.resolve_local(*id, name.lexeme);
            }

            Expr::Get { object, .. } => self.resolve(object),

            Expr::Set { object, value, .. } => {
                self.resolve(object);
                self.resolve(value);
            }

            Expr::Unary { right, .. } => self.resolve(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve(left);
                self.resolve(right);
            }
        }
    }

    /// Hand over the finished map.
    pub fn finish(self) -> Locals {
        info!("Resolver finished with {} local reference(s)", self.locals.len());

        self.locals
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        // innermost → outermost
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains(name) {
                debug!("Resolved '{}' ({:?}) at depth {}", name, id, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' ({:?}) as global", name, id);
    }
}
