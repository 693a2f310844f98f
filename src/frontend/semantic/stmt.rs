//! Statement resolution

use super::scope::ScopeKind;
use super::{Breakable, Resolver};
use crate::frontend::ast::{Stmt, StmtId, Symbol};
use crate::types::Type;
use crate::utils::{ErrorKind, Result};

impl Resolver<'_> {
    pub(super) fn resolve_stmt(&mut self, id: StmtId) -> Result<()> {
        let line = self.program.stmt(id).line;
        let kind = match self.program.stmt(id).kind.clone() {
            Stmt::Block(stmts) => {
                self.in_new_scope(ScopeKind::Block, |r| r.resolve_stmts(&stmts))?;
                Stmt::Block(stmts)
            }
            Stmt::If { cond, on_true, on_false } => {
                let cond = self.resolve_bool(cond)?;
                self.resolve_stmt(on_true)?;
                if let Some(on_false) = on_false {
                    self.resolve_stmt(on_false)?;
                }
                Stmt::If { cond, on_true, on_false }
            }
            Stmt::While { cond, body } => {
                let cond = self.resolve_bool(cond)?;
                self.in_breakable(Breakable::Loop, |r| r.resolve_stmt(body))?;
                Stmt::While { cond, body }
            }
            Stmt::DoWhile { body, cond } => {
                self.in_breakable(Breakable::Loop, |r| r.resolve_stmt(body))?;
                let cond = self.resolve_bool(cond)?;
                Stmt::DoWhile { body, cond }
            }
            Stmt::For { init, cond, advance, body } => self.in_new_scope(ScopeKind::ForInit, |r| {
                let init = init.map(|init| r.resolve_expr(init)).transpose()?;
                let cond = cond.map(|cond| r.resolve_bool(cond)).transpose()?;
                let advance = advance.map(|advance| r.resolve_expr(advance)).transpose()?;
                r.in_breakable(Breakable::Loop, |r| r.resolve_stmt(body))?;
                Ok(Stmt::For { init, cond, advance, body })
            })?,
            Stmt::Switch { value, mut cases, default } => {
                let value = self.resolve_expr(value)?;
                self.in_new_scope(ScopeKind::Switch, |r| {
                    r.in_breakable(Breakable::Switch, |r| {
                        for case in &mut cases {
                            for label in &mut case.values {
                                *label = r.resolve_expr(*label)?;
                            }
                            r.resolve_stmts(&case.body)?;
                        }
                        if let Some(default) = &default {
                            r.resolve_stmts(default)?;
                        }
                        Ok(())
                    })
                })?;
                Stmt::Switch { value, cases, default }
            }
            Stmt::Return(value) => {
                let expected = self
                    .method
                    .and_then(|method| self.program.method(method).ty.clone())
                    .unwrap_or(Type::Void);
                match value {
                    Some(value) => {
                        let value = self.resolve_expr(value)?;
                        if expected == Type::Void {
                            let kind = ErrorKind::type_mismatch("void", self.describe_expr(value));
                            return Err(self.error(line, kind));
                        }
                        self.coerce(value, &expected)?;
                        Stmt::Return(Some(value))
                    }
                    None if expected != Type::Void => {
                        let kind = ErrorKind::type_mismatch(self.program.describe(&expected), "void");
                        return Err(self.error(line, kind));
                    }
                    None => Stmt::Return(None),
                }
            }
            Stmt::Break => {
                if self.breakables.is_empty() {
                    return Err(self.error(line, invalid_statement("break outside loop or switch")));
                }
                Stmt::Break
            }
            Stmt::Continue => {
                if !self.breakables.contains(&Breakable::Loop) {
                    return Err(self.error(line, invalid_statement("continue outside loop")));
                }
                Stmt::Continue
            }
            Stmt::Throw(value) => {
                let value = self.resolve_expr(value)?;
                self.coerce(value, &Type::StringPointer)?;
                Stmt::Throw(value)
            }
            Stmt::Delete(value) => {
                let value = self.resolve_expr(value)?;
                let ty = self.expr_type(value);
                if !matches!(ty, Type::ClassPointer { .. } | Type::ArrayPointer { .. }) {
                    let kind = ErrorKind::type_mismatch("class or array pointer", self.program.describe(&ty));
                    return Err(self.error(line, kind));
                }
                Stmt::Delete(value)
            }
            Stmt::Expr(expr) => Stmt::Expr(self.resolve_expr(expr)?),
            Stmt::Const(konst) => {
                self.resolve_const(konst)?;
                let name = self.program.constant(konst).name.clone();
                self.symbols.define(&name, Symbol::Const(konst)).map_err(|kind| self.error(line, kind))?;
                Stmt::Const(konst)
            }
        };
        self.program.stmt_mut(id).kind = kind;
        Ok(())
    }

    fn resolve_stmts(&mut self, stmts: &[StmtId]) -> Result<()> {
        for &stmt in stmts {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }
}

fn invalid_statement(reason: &str) -> ErrorKind {
    ErrorKind::InvalidStatement { reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::{BinaryOp, Case, ConstOwner, Literal, Program, Stmt, StmtId};
    use crate::frontend::semantic::resolve;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    /// Resolve `body` as the block of `Test.Run()`, returning `int` when
    /// `returns_int`
    fn run(returns_int: bool, build: impl FnOnce(&mut Program) -> Vec<StmtId>) -> Result<Program, ErrorKind> {
        let mut program = Program::new();
        let file = program.add_file("stmt.ci");
        let class = program.add_class(file, 1, "Test", None);
        let stmts = build(&mut program);
        let body = program.add_stmt(2, Stmt::Block(stmts));
        let ret = returns_int.then(|| program.name(2, "int"));
        program.add_method(class, 2, "Run", ret, vec![], Some(body));
        resolve(&mut program).map_err(|e| e.kind)?;
        Ok(program)
    }

    #[test]
    fn test_condition_must_be_bool() {
        let err = run(false, |p| {
            let one = p.int(3, 1);
            let empty = p.add_stmt(3, Stmt::Block(vec![]));
            vec![p.add_stmt(3, Stmt::While { cond: one, body: empty })]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::type_mismatch("bool", "1..1"));
    }

    #[test]
    fn test_if_condition_is_folded_in_place() {
        let mut stmt = None;
        let program = run(false, |p| {
            let one = p.int(3, 1);
            let two = p.int(3, 2);
            let cond = p.binary(3, BinaryOp::Less, one, two);
            let empty = p.add_stmt(3, Stmt::Block(vec![]));
            let id = p.add_stmt(3, Stmt::If { cond, on_true: empty, on_false: None });
            stmt = Some(id);
            vec![id]
        })
        .unwrap();
        let Stmt::If { cond, .. } = program.stmt(stmt.unwrap()).kind else { panic!("not if") };
        assert_eq!(program.literal(cond), Some(&Literal::Bool(true)));
    }

    #[test]
    fn test_block_scope_ends() {
        let err = run(false, |p| {
            let ty = p.name(3, "int");
            let decl = p.local_var(3, "x", ty, None);
            let decl = p.add_stmt(3, Stmt::Expr(decl));
            let inner = p.add_stmt(3, Stmt::Block(vec![decl]));
            let x = p.name(4, "x");
            vec![inner, p.add_stmt(4, Stmt::Expr(x))]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::SymbolNotFound { name: "x".into() });
    }

    #[test]
    fn test_for_loop_scope() {
        let program = run(false, |p| {
            // for (int i = 0; i < 10; i++) continue;
            let ty = p.name(3, "int");
            let zero = p.int(3, 0);
            let init = p.local_var(3, "i", ty, Some(zero));
            let i = p.name(3, "i");
            let ten = p.int(3, 10);
            let cond = p.binary(3, BinaryOp::Less, i, ten);
            let i = p.name(3, "i");
            let advance = p.postfix(3, crate::frontend::ast::PostfixOp::Increment, i);
            let body = p.add_stmt(3, Stmt::Continue);
            vec![p.add_stmt(3, Stmt::For { init: Some(init), cond: Some(cond), advance: Some(advance), body })]
        });
        assert!(program.is_ok());
    }

    #[test]
    fn test_break_and_continue_placement() {
        let err = run(false, |p| vec![p.add_stmt(3, Stmt::Break)]);
        assert!(matches!(err.unwrap_err(), ErrorKind::InvalidStatement { .. }));

        // continue inside a switch that is not inside a loop
        let err = run(false, |p| {
            let value = p.int(3, 1);
            let label = p.int(3, 1);
            let cont = p.add_stmt(4, Stmt::Continue);
            let cases = vec![Case { values: vec![label], body: vec![cont] }];
            vec![p.add_stmt(3, Stmt::Switch { value, cases, default: None })]
        });
        assert!(matches!(err.unwrap_err(), ErrorKind::InvalidStatement { .. }));
    }

    #[test]
    fn test_switch_cases_share_one_scope() {
        let err = run(false, |p| {
            let value = p.int(3, 1);
            let mut cases = Vec::new();
            for (label, line) in [(1, 4), (2, 5)] {
                let label = p.int(line, label);
                let ty = p.name(line, "int");
                let decl = p.local_var(line, "tmp", ty, None);
                let decl = p.add_stmt(line, Stmt::Expr(decl));
                let brk = p.add_stmt(line, Stmt::Break);
                cases.push(Case { values: vec![label], body: vec![decl, brk] });
            }
            vec![p.add_stmt(3, Stmt::Switch { value, cases, default: None })]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::DuplicateSymbol { name: "tmp".into() });
    }

    #[test]
    fn test_return_checks_method_type() {
        let ok = run(true, |p| {
            let value = p.int(3, 42);
            vec![p.add_stmt(3, Stmt::Return(Some(value)))]
        });
        assert!(ok.is_ok());

        let err = run(false, |p| {
            let value = p.int(3, 42);
            vec![p.add_stmt(3, Stmt::Return(Some(value)))]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::type_mismatch("void", "42..42"));

        let err = run(true, |p| vec![p.add_stmt(3, Stmt::Return(None))]);
        assert_eq!(err.unwrap_err(), ErrorKind::type_mismatch("int", "void"));

        let err = run(true, |p| {
            let value = p.string(3, "no");
            vec![p.add_stmt(3, Stmt::Return(Some(value)))]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::type_mismatch("int", "string"));
    }

    #[test]
    fn test_throw_and_delete() {
        let err = run(false, |p| {
            let value = p.int(3, 1);
            vec![p.add_stmt(3, Stmt::Throw(value))]
        });
        assert_eq!(err.unwrap_err(), ErrorKind::type_mismatch("string", "1..1"));

        let ok = run(false, |p| {
            let name = p.name(3, "Test");
            let storage = p.call(3, name, vec![]);
            let object = p.prefix(3, crate::frontend::ast::PrefixOp::New, storage);
            vec![p.add_stmt(3, Stmt::Delete(object))]
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn test_local_constant() {
        let program = run(false, |p| {
            let value = p.int(3, 8);
            let konst = p.add_const(ConstOwner::Local, 3, "Eight", None, Some(value));
            let decl = p.add_stmt(3, Stmt::Const(konst));
            let eight = p.name(4, "Eight");
            let one = p.int(4, 1);
            let sum = p.binary(4, BinaryOp::Add, eight, one);
            vec![decl, p.add_stmt(4, Stmt::Expr(sum))]
        })
        .unwrap();
        let last = program.stmts.iter().rev().find_map(|s| match s.kind {
            Stmt::Expr(e) => Some(e),
            _ => None,
        });
        assert_eq!(program.literal(last.unwrap()), Some(&Literal::Int(9)));
    }
}
