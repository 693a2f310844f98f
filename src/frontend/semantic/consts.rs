//! Constant resolution

use log::trace;

use super::scope::ScopeId;
use super::Resolver;
use crate::frontend::ast::{BinaryOp, ConstId, ConstOwner, Expr, ExprId, Symbol};
use crate::types::Type;
use crate::utils::{ErrorKind, Result};

impl Resolver<'_> {
    /// Resolve a constant's initializer in the scope it was declared in
    pub(super) fn resolve_const(&mut self, konst: ConstId) -> Result<()> {
        let context = match self.program.constant(konst).owner {
            ConstOwner::Program(file) => Some((file, ScopeId::PROGRAM)),
            ConstOwner::Class(class) => Some((self.program.class(class).file, self.class_scopes[class.index()])),
            ConstOwner::Enum(e) => Some((self.program.enumeration(e).file, self.enum_scopes[e.index()])),
            ConstOwner::Local => None,
        };
        match context {
            Some((file, scope)) => {
                self.with_context(file, scope, |r| r.resolve_once(konst, |r| r.resolve_const_value(konst)))
            }
            None => self.resolve_once(konst, |r| r.resolve_const_value(konst)),
        }
    }

    fn resolve_const_value(&mut self, konst: ConstId) -> Result<()> {
        let (line, owner, type_expr, value) = {
            let k = self.program.constant(konst);
            (k.line, k.owner, k.type_expr, k.value)
        };
        let declared = type_expr.map(|t| self.to_type(t)).transpose()?;

        let ty = if let ConstOwner::Enum(e) = owner {
            if let Some(value) = value {
                let value = self.resolve_expr(value)?;
                self.program.constant_mut(konst).value = Some(value);
                let got = self.expr_type(value);
                if !got.is_integer() && got != Type::Enum(e) {
                    return Err(self.error(line, ErrorKind::type_mismatch("integer", self.program.describe(&got))));
                }
            }
            Type::Enum(e)
        } else {
            let value = value.ok_or_else(|| self.error(line, ErrorKind::ExpectedConstant))?;
            let value = self.resolve_expr(value)?;
            self.program.constant_mut(konst).value = Some(value);
            if let Some(declared) = declared.as_ref().filter(|d| !d.is_array()) {
                self.coerce(value, declared)?;
            }
            if !self.is_constant(value) {
                return Err(self.error(line, ErrorKind::ExpectedConstant));
            }
            self.expr_type(value)
        };

        trace!("const {} : {}", self.program.constant(konst).name, self.program.describe(&ty));
        self.program.constant_mut(konst).ty = Some(ty);
        Ok(())
    }

    /// Literal, enumerator, or a collection of those
    fn is_constant(&self, expr: ExprId) -> bool {
        match &self.program.expr(expr).kind {
            Expr::Literal(_) => true,
            Expr::Collection { items } => items.iter().all(|&item| self.is_constant(item)),
            Expr::Symbol(_) | Expr::Binary { op: BinaryOp::Dot, .. } => match self.symbol_of(expr) {
                Some(Symbol::Const(konst)) => matches!(self.program.constant(konst).owner, ConstOwner::Enum(_)),
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::{BinaryOp, ConstId, ConstOwner, Expr, Literal, Operand, Program, Symbol};
    use crate::frontend::semantic::resolve;
    use crate::types::Type;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constants_resolve_in_any_order() {
        // const int B = A * 2; const int A = 21;
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let a_ref = program.name(1, "A");
        let two = program.int(1, 2);
        let product = program.binary(1, BinaryOp::Mul, a_ref, two);
        let b = program.add_const(ConstOwner::Program(file), 1, "B", None, Some(product));
        let value = program.int(2, 21);
        program.add_const(ConstOwner::Program(file), 2, "A", None, Some(value));

        resolve(&mut program).unwrap();

        let b = program.constant(b);
        assert_eq!(b.ty, Some(Type::range(42, 42)));
        assert_eq!(program.literal(b.value.unwrap()), Some(&Literal::Int(42)));
    }

    #[test]
    fn test_transitive_constant_cycle() {
        // const int A = B + 1; const int B = C; const int C = A;
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let b_ref = program.name(1, "B");
        let one = program.int(1, 1);
        let a_value = program.binary(1, BinaryOp::Add, b_ref, one);
        program.add_const(ConstOwner::Program(file), 1, "A", None, Some(a_value));
        let c_ref = program.name(2, "C");
        program.add_const(ConstOwner::Program(file), 2, "B", None, Some(c_ref));
        let a_ref = program.name(3, "A");
        program.add_const(ConstOwner::Program(file), 3, "C", None, Some(a_ref));

        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CircularConstant { name: "A".into() });
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_class_constant_visible_from_derived_class() {
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let base = program.add_class(file, 1, "Base", None);
        let derived = program.add_class(file, 3, "Derived", Some("Base"));
        let limit = program.int(2, 100);
        program.add_const(ConstOwner::Class(base), 2, "Limit", None, Some(limit));
        let limit_ref = program.name(4, "Limit");
        let one = program.int(4, 1);
        let value = program.binary(4, BinaryOp::Sub, limit_ref, one);
        let last = program.add_const(ConstOwner::Class(derived), 4, "Last", None, Some(value));

        resolve(&mut program).unwrap();
        assert_eq!(program.literal(program.constant(last).value.unwrap()), Some(&Literal::Int(99)));
    }

    #[test]
    fn test_declared_type_is_checked() {
        // const byte Big = 300;
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let ty = program.name(1, "byte");
        let value = program.int(1, 300);
        program.add_const(ConstOwner::Program(file), 1, "Big", Some(ty), Some(value));

        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::type_mismatch("0..255", "300..300"));
    }

    #[test]
    fn test_enumerators_are_typed_as_their_enum() {
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let color = program.add_enum(file, 1, "Color");
        let red = program.add_const(ConstOwner::Enum(color), 1, "Red", None, None);
        let five = program.int(1, 5);
        let green = program.add_const(ConstOwner::Enum(color), 1, "Green", None, Some(five));

        resolve(&mut program).unwrap();
        assert_eq!(program.constant(red).ty, Some(Type::Enum(color)));
        assert_eq!(program.constant(green).ty, Some(Type::Enum(color)));
    }

    #[test]
    fn test_constant_of_enum_type() {
        // enum Color { Red }
        // const Color Fallback = Color.Red;
        // class Paint { const Color Default = Color.Red; }
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let color = program.add_enum(file, 1, "Color");
        let red = program.add_const(ConstOwner::Enum(color), 1, "Red", None, None);
        let paint = program.add_class(file, 2, "Paint", None);
        fn declare(program: &mut Program, owner: ConstOwner, line: u32, name: &str) -> ConstId {
            let ty = program.name(line, "Color");
            let enum_name = program.name(line, "Color");
            let value = program.member(line, enum_name, "Red");
            program.add_const(owner, line, name, Some(ty), Some(value))
        }
        let global = declare(&mut program, ConstOwner::Program(file), 4, "Fallback");
        let member = declare(&mut program, ConstOwner::Class(paint), 3, "Default");

        resolve(&mut program).unwrap();
        for konst in [global, member] {
            let konst = program.constant(konst);
            assert_eq!(konst.ty, Some(Type::Enum(color)));
            let value = konst.value.unwrap();
            assert_eq!(program.literal(value), None);
            let Expr::Binary { right: Operand::Expr(member), .. } = &program.expr(value).kind else {
                panic!("enumerator was rewritten")
            };
            let Expr::Symbol(reference) = &program.expr(*member).kind else { panic!("not a name") };
            assert_eq!(reference.symbol, Some(Symbol::Const(red)));
        }
    }

    #[test]
    fn test_field_reference_is_not_constant() {
        // class Holder { int size; const int Copy = size; }
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let holder = program.add_class(file, 1, "Holder", None);
        let int = program.name(2, "int");
        program.add_field(holder, 2, "size", int);
        let size = program.name(3, "size");
        program.add_const(ConstOwner::Class(holder), 3, "Copy", None, Some(size));

        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedConstant);
    }
}
