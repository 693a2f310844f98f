//! Semantic Resolution for Ci
//!
//! Turns a parsed, untyped [`Program`] into a typed one:
//! - Class hierarchy linearization with cycle detection
//! - Constant resolution with cycle detection
//! - Type expressions reinterpreted as types
//! - Expression typing, integer range analysis and constant folding
//!
//! Phases run in order over the whole program and the first error aborts
//! the pass.

mod coerce;
mod consts;
mod expr;
mod hierarchy;
pub mod scope;
mod stmt;
mod type_expr;
mod visit;

use log::debug;

use crate::frontend::ast::{ClassId, ConstOwner, EnumId, FileId, MethodId, Program, Symbol};
use crate::types::Type;
use crate::utils::{Error, ErrorKind, Result};
use scope::{ScopeId, ScopeKind, SymbolTable};

pub use coerce::is_assignable;

/// Resolve `program` in place
pub fn resolve(program: &mut Program) -> Result<()> {
    Resolver::new(program).run()
}

/// Enclosing statement that `break`/`continue` can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakable {
    Loop,
    Switch,
}

pub struct Resolver<'p> {
    program: &'p mut Program,
    symbols: SymbolTable,
    class_scopes: Vec<ScopeId>,
    enum_scopes: Vec<ScopeId>,
    /// File errors are reported against
    file: FileId,
    /// Method whose body is being resolved
    method: Option<MethodId>,
    breakables: Vec<Breakable>,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p mut Program) -> Self {
        Self {
            program,
            symbols: SymbolTable::new(),
            class_scopes: Vec::new(),
            enum_scopes: Vec::new(),
            file: FileId(0),
            method: None,
            breakables: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<()> {
        debug!("registering symbols");
        self.register_builtins()?;
        self.register_declarations()?;

        debug!("resolving class hierarchy");
        let classes: Vec<ClassId> = self.program.class_ids().collect();
        for class in classes {
            self.resolve_class(class)?;
        }

        debug!("resolving constants");
        self.resolve_consts()?;

        debug!("resolving declared types");
        let ordered = self.program.ordered.clone();
        for &class in &ordered {
            self.resolve_types(class)?;
        }

        debug!("resolving method bodies");
        for &class in &ordered {
            self.resolve_code(class)?;
        }
        Ok(())
    }

    // ==================== Registration ====================

    fn register_builtins(&mut self) -> Result<()> {
        let builtins = [
            ("bool", Type::Bool),
            ("sbyte", Type::range(i8::MIN as i64, i8::MAX as i64)),
            ("byte", Type::range(0, u8::MAX as i64)),
            ("short", Type::range(i16::MIN as i64, i16::MAX as i64)),
            ("ushort", Type::range(0, u16::MAX as i64)),
            ("int", Type::INT),
            ("uint", Type::range(0, u32::MAX as i64)),
            ("long", Type::LONG),
            ("float", Type::FLOAT),
            ("double", Type::DOUBLE),
            ("string", Type::StringPointer),
        ];
        for (name, ty) in builtins {
            self.symbols
                .define_in(ScopeId::PROGRAM, name, Symbol::Type(ty))
                .map_err(|kind| self.error(0, kind))?;
        }
        Ok(())
    }

    fn register_declarations(&mut self) -> Result<()> {
        let classes: Vec<ClassId> = self.program.class_ids().collect();
        for class in classes {
            let c = self.program.class(class);
            self.file = c.file;
            let (name, line) = (c.name.clone(), c.line);
            self.define_global(&name, line, Symbol::Class(class))?;
            let scope = self.symbols.add_scope(ScopeKind::Class(class), ScopeId::PROGRAM);
            self.class_scopes.push(scope);
        }

        let enums: Vec<EnumId> = self.program.enum_ids().collect();
        for e in enums {
            let enumeration = self.program.enumeration(e);
            self.file = enumeration.file;
            let (name, line) = (enumeration.name.clone(), enumeration.line);
            let values = enumeration.values.clone();
            self.define_global(&name, line, Symbol::Enum(e))?;
            let scope = self.symbols.add_scope(ScopeKind::Enum(e), ScopeId::PROGRAM);
            self.enum_scopes.push(scope);
            for konst in values {
                let (name, line) = {
                    let k = self.program.constant(konst);
                    (k.name.clone(), k.line)
                };
                self.symbols
                    .define_in(scope, &name, Symbol::Const(konst))
                    .map_err(|kind| self.error(line, kind))?;
            }
        }

        for konst in self.program.globals.clone() {
            let k = self.program.constant(konst);
            if let ConstOwner::Program(file) = k.owner {
                self.file = file;
            }
            let (name, line) = (k.name.clone(), k.line);
            self.define_global(&name, line, Symbol::Const(konst))?;
        }
        Ok(())
    }

    fn define_global(&mut self, name: &str, line: u32, symbol: Symbol) -> Result<()> {
        self.symbols
            .define_in(ScopeId::PROGRAM, name, symbol)
            .map_err(|kind| self.error(line, kind))
    }

    // ==================== Phases ====================

    fn resolve_consts(&mut self) -> Result<()> {
        for konst in self.program.globals.clone() {
            self.resolve_const(konst)?;
        }
        let enums: Vec<EnumId> = self.program.enum_ids().collect();
        for e in enums {
            for konst in self.program.enumeration(e).values.clone() {
                self.resolve_const(konst)?;
            }
        }
        for class in self.program.ordered.clone() {
            for konst in self.program.class(class).consts.clone() {
                self.resolve_const(konst)?;
            }
        }
        Ok(())
    }

    /// Field, return and parameter types of one class
    fn resolve_types(&mut self, class: ClassId) -> Result<()> {
        let file = self.program.class(class).file;
        let scope = self.class_scopes[class.index()];
        self.with_context(file, scope, |r| {
            for field in r.program.class(class).fields.clone() {
                let ty = r.to_type(r.program.field(field).type_expr)?;
                r.program.field_mut(field).ty = Some(ty);
            }
            for method in r.program.class(class).methods.clone() {
                let ty = match r.program.method(method).type_expr {
                    Some(type_expr) => r.to_type(type_expr)?,
                    None => Type::Void,
                };
                r.program.method_mut(method).ty = Some(ty);
                for param in r.program.method(method).params.clone() {
                    let ty = r.to_type(r.program.var(param).type_expr)?;
                    r.program.var_mut(param).ty = Some(ty);
                }
            }
            Ok(())
        })
    }

    fn resolve_code(&mut self, class: ClassId) -> Result<()> {
        let file = self.program.class(class).file;
        let class_scope = self.class_scopes[class.index()];
        for method in self.program.class(class).methods.clone() {
            let Some(body) = self.program.method(method).body else { continue };
            debug!("resolving {}.{}", self.program.class(class).name, self.program.method(method).name);
            let params = self.symbols.add_scope(ScopeKind::Parameters, class_scope);
            self.method = Some(method);
            let result = self.with_context(file, params, |r| {
                for param in r.program.method(method).params.clone() {
                    let (name, line) = {
                        let var = r.program.var(param);
                        (var.name.clone(), var.line)
                    };
                    r.symbols.define(&name, Symbol::Var(param)).map_err(|kind| r.error(line, kind))?;
                }
                r.resolve_stmt(body)
            });
            self.method = None;
            result?;
        }
        Ok(())
    }

    // ==================== Helpers ====================

    fn error(&self, line: u32, kind: ErrorKind) -> Error {
        let file = self.program.files.get(self.file.index()).cloned().unwrap_or_default();
        Error::new(file, line, kind)
    }

    /// Run `f` with `file` and `scope` current, restoring both afterwards
    fn with_context<T>(
        &mut self,
        file: FileId,
        scope: ScopeId,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_file = std::mem::replace(&mut self.file, file);
        let saved_scope = self.symbols.set_current(scope);
        let result = f(self);
        self.symbols.set_current(saved_scope);
        self.file = saved_file;
        result
    }

    /// Run `f` in a fresh child of the current scope
    fn in_new_scope<T>(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let scope = self.symbols.add_scope(kind, self.symbols.current());
        self.with_context(self.file, scope, f)
    }

    /// Run `f` as the body of a loop or switch
    fn in_breakable<T>(&mut self, kind: Breakable, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.breakables.push(kind);
        let result = f(self);
        self.breakables.pop();
        result
    }
}
