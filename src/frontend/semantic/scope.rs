//! Scope chain for name resolution

use std::collections::HashMap;

use crate::frontend::ast::{ClassId, EnumId, Symbol};
use crate::utils::ErrorKind;

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Builtins, classes, enums and top-level constants
    pub const PROGRAM: ScopeId = ScopeId(0);
}

/// What introduced a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Class(ClassId),
    Enum(EnumId),
    Parameters,
    Block,
    ForInit,
    Switch,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    symbols: HashMap<String, Symbol>,
}

/// Parent-linked scopes, with one current scope
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let program = Scope {
            kind: ScopeKind::Program,
            parent: None,
            symbols: HashMap::new(),
        };
        Self {
            scopes: vec![program],
            current: ScopeId::PROGRAM,
        }
    }

    /// Create a scope without entering it
    pub fn add_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            symbols: HashMap::new(),
        });
        id
    }

    /// Make `scope` current, returning the previous current scope
    pub fn set_current(&mut self, scope: ScopeId) -> ScopeId {
        std::mem::replace(&mut self.current, scope)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }

    pub fn is_enum(&self, scope: ScopeId) -> bool {
        matches!(self.kind(scope), ScopeKind::Enum(_))
    }

    /// Re-parent a class scope under its base class scope
    pub fn set_parent(&mut self, scope: ScopeId, parent: ScopeId) {
        self.scopes[scope.0].parent = Some(parent);
    }

    /// Define a symbol in the current scope
    pub fn define(&mut self, name: &str, symbol: Symbol) -> Result<(), ErrorKind> {
        self.define_in(self.current, name, symbol)
    }

    pub fn define_in(&mut self, scope: ScopeId, name: &str, symbol: Symbol) -> Result<(), ErrorKind> {
        let symbols = &mut self.scopes[scope.0].symbols;
        if symbols.contains_key(name) {
            return Err(ErrorKind::DuplicateSymbol { name: name.to_string() });
        }
        symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Look up a symbol, searching from the current scope outward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.lookup_from(self.current, name)
    }

    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut scope_id = Some(scope);
        while let Some(id) = scope_id {
            if let Some(symbol) = self.scopes[id.0].symbols.get(name) {
                return Some(symbol);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }

    /// Look up a member of a class (including inherited members) or enum,
    /// never falling through to the program scope
    pub fn lookup_member(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut scope_id = Some(scope);
        while let Some(id) = scope_id {
            let scope = &self.scopes[id.0];
            if !matches!(scope.kind, ScopeKind::Class(_) | ScopeKind::Enum(_)) {
                break;
            }
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            scope_id = scope.parent;
        }
        None
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
