//! Lexically scoped name bindings.
//!
//! [`TypeEnv`] manages a stack of scopes. Each scope carries its bindings
//! and the kind of code it belongs to, which answers "are we inside a loop?"
//! and "are we inside an async body?" without separate flags.

use std::collections::HashMap;

use crate::ty::Type;

// ══════════════════════════════════════════════════════════════════════════════
// Scope Kind
// ══════════════════════════════════════════════════════════════════════════════

/// What kind of code context a scope represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top-level program scope: builtins, declarations, imports.
    Global,
    /// Body of a function, method or lambda.
    Function { is_async: bool },
    /// Header and body of a `for`, `for-in`, `while` or `loop`.
    Loop,
    /// Any other block (`if` branches, bare `{ }`).
    Block,
}

impl ScopeKind {
    fn is_function(self) -> bool {
        matches!(self, ScopeKind::Function { .. })
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scope
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    bindings: HashMap<String, Type>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            bindings: HashMap::new(),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeEnv
// ══════════════════════════════════════════════════════════════════════════════

/// A stack of scopes for name resolution.
#[derive(Debug)]
pub struct TypeEnv {
    scopes: Vec<Scope>,
}

impl TypeEnv {
    /// Create a new environment holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global)],
        }
    }

    /// Push a new scope onto the stack.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    /// Pop the top scope off the stack. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the global scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind `name` in the innermost scope. Redefinition in the same scope
    /// silently replaces the earlier binding.
    pub fn define(&mut self, name: &str, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), ty);
        }
    }

    /// Look up a binding by name, searching from innermost to outermost scope.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// The innermost binding of `name` lives in the global scope.
    pub fn resolves_globally(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.bindings.contains_key(name))
            .is_some_and(|scope| scope.kind == ScopeKind::Global)
    }

    /// Number of scopes on the stack; 1 means global.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn at_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Inside a loop body, without crossing a function boundary.
    pub fn in_loop(&self) -> bool {
        self.scopes
            .iter()
            .rev()
            .take_while(|s| !s.kind.is_function())
            .any(|s| s.kind == ScopeKind::Loop)
    }

    /// The innermost function scope is async.
    pub fn in_async(&self) -> bool {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind.is_function())
            .is_some_and(|s| s.kind == ScopeKind::Function { is_async: true })
    }

    /// Get the kind of the current (innermost) scope.
    pub fn current_scope_kind(&self) -> ScopeKind {
        self.scopes
            .last()
            .map_or(ScopeKind::Global, |scope| scope.kind)
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
