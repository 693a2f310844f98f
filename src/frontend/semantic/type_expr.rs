//! Type expressions
//!
//! Types are written with ordinary expression syntax and interpreted by shape:
//!
//! | Shape          | Type                                  |
//! |----------------|---------------------------------------|
//! | `name`         | builtin, enum, or read-only class pointer |
//! | `name!`        | mutable class pointer                 |
//! | `name()`       | string or class storage               |
//! | `a < b`        | range `a..b-1`                        |
//! | `a <= b`       | range `a..b`                          |
//! | `<b`, `<=b`    | range starting at zero                |
//! | `T[]`, `T[n]`  | array pointer, array storage          |

use super::scope::ScopeId;
use super::Resolver;
use crate::frontend::ast::{BinaryOp, Expr, ExprId, Literal, Operand, PostfixOp, PrefixOp, Symbol, SymbolRef};
use crate::types::{RangeType, Type};
use crate::utils::{ErrorKind, Result};

/// One `[]` or `[n]` suffix
enum Dimension {
    Pointer { mutable: bool },
    Storage { length: u32 },
}

impl Resolver<'_> {
    /// Interpret a type expression, recording the type on its nodes: the
    /// base name gets its own type, every `[]`, `[n]` and `!` node the
    /// type of the whole expression
    pub(super) fn to_type(&mut self, expr: ExprId) -> Result<Type> {
        let mut spelling = vec![expr];
        let (mut base, mut mutable) = self.strip_mutable(expr);
        // rightmost suffix first; it is the innermost array
        let mut dimensions = Vec::new();
        while let Some((left, right)) = self.array_suffix(base) {
            spelling.push(base);
            let dimension = match right {
                None => Dimension::Pointer { mutable },
                Some(length) => {
                    if mutable {
                        return Err(self.unexpected_bang(base));
                    }
                    let (length_expr, length) = self.fold_const_uint(length)?;
                    self.set_binary(base, BinaryOp::Index, left, Operand::Expr(length_expr));
                    Dimension::Storage { length }
                }
            };
            dimensions.push(dimension);
            (base, mutable) = self.strip_mutable(left);
            if base != left {
                spelling.push(left);
            }
        }

        let mut ty = self.to_base_type(base, mutable)?;
        for dimension in dimensions {
            let element = Box::new(ty);
            ty = match dimension {
                Dimension::Pointer { mutable } => Type::ArrayPointer { element, mutable },
                Dimension::Storage { length } => Type::ArrayStorage { element, length },
            };
        }
        for node in spelling.into_iter().filter(|&node| node != base) {
            self.program.expr_mut(node).ty = Some(ty.clone());
        }
        Ok(ty)
    }

    /// `T!` -> (`T`, true)
    fn strip_mutable(&self, expr: ExprId) -> (ExprId, bool) {
        match self.program.expr(expr).kind {
            Expr::Postfix { op: PostfixOp::Bang, inner } => (inner, true),
            _ => (expr, false),
        }
    }

    fn array_suffix(&self, expr: ExprId) -> Option<(ExprId, Option<ExprId>)> {
        match &self.program.expr(expr).kind {
            Expr::Binary { op: BinaryOp::Index, left, right: Operand::None } => Some((*left, None)),
            Expr::Binary { op: BinaryOp::Index, left, right: Operand::Expr(length) } => Some((*left, Some(*length))),
            _ => None,
        }
    }

    /// Type of the innermost, suffix-free part of a type expression,
    /// recorded on `expr`
    fn to_base_type(&mut self, expr: ExprId, mutable: bool) -> Result<Type> {
        let kind = self.program.expr(expr).kind.clone();
        let ty = match kind {
            Expr::Symbol(reference) => {
                let symbol = self.symbols.lookup_from(ScopeId::PROGRAM, &reference.name).cloned();
                let ty = match &symbol {
                    Some(Symbol::Class(class)) => Type::ClassPointer { class: *class, mutable },
                    Some(Symbol::Type(ty)) => ty.clone(),
                    Some(Symbol::Enum(e)) => Type::Enum(*e),
                    Some(_) => {
                        let reason = format!("{} is not a type", reference.name);
                        return Err(self.expr_error(expr, ErrorKind::invalid_type(reason)));
                    }
                    None => {
                        return Err(self.expr_error(expr, ErrorKind::SymbolNotFound { name: reference.name }));
                    }
                };
                self.program.expr_mut(expr).kind = Expr::Symbol(SymbolRef { name: reference.name, symbol });
                ty
            }
            Expr::Binary { op: BinaryOp::Call, left, right: Operand::Args(args) } => {
                if !args.is_empty() {
                    return Err(self.expr_error(expr, ErrorKind::invalid_type("expected empty parentheses on storage type")));
                }
                self.to_storage_type(left)?
            }
            Expr::Binary { op: op @ (BinaryOp::Less | BinaryOp::LessOrEqual), left, right: Operand::Expr(right) } => {
                let (left, min) = self.fold_const(left)?;
                let (right, ty) = self.to_range(min, right, op == BinaryOp::Less)?;
                self.set_binary(expr, op, left, Operand::Expr(right));
                ty
            }
            Expr::Prefix { op: op @ (PrefixOp::Less | PrefixOp::LessOrEqual), inner } => {
                let (inner, ty) = self.to_range(0, inner, op == PrefixOp::Less)?;
                self.program.expr_mut(expr).kind = Expr::Prefix { op, inner };
                ty
            }
            _ => return Err(self.expr_error(expr, ErrorKind::invalid_type("invalid type"))),
        };
        if mutable && !matches!(ty, Type::ClassPointer { .. }) {
            return Err(self.unexpected_bang(expr));
        }
        self.program.expr_mut(expr).ty = Some(ty.clone());
        Ok(ty)
    }

    /// `string()` or `Class()`
    fn to_storage_type(&mut self, name: ExprId) -> Result<Type> {
        let Expr::Symbol(reference) = self.program.expr(name).kind.clone() else {
            return Err(self.expr_error(name, ErrorKind::invalid_type("expected name of storage type")));
        };
        let ty = if reference.name == "string" {
            Type::StringStorage
        } else {
            match self.symbols.lookup_from(ScopeId::PROGRAM, &reference.name).cloned() {
                Some(symbol @ Symbol::Class(class)) => {
                    self.program.expr_mut(name).kind =
                        Expr::Symbol(SymbolRef { name: reference.name, symbol: Some(symbol) });
                    Type::ClassStorage(class)
                }
                _ => return Err(self.expr_error(name, ErrorKind::SymbolNotFound { name: reference.name })),
            }
        };
        self.program.expr_mut(name).ty = Some(ty.clone());
        Ok(ty)
    }

    /// Range ending at the folded `max_expr`; returns the folded handle too
    fn to_range(&mut self, min: i64, max_expr: ExprId, exclusive: bool) -> Result<(ExprId, Type)> {
        let (folded, mut max) = self.fold_const(max_expr)?;
        if exclusive {
            max = max.saturating_sub(1);
        }
        if min > max {
            return Err(self.expr_error(max_expr, ErrorKind::RangeMinGreaterThanMax { min, max }));
        }
        Ok((folded, Type::Range(RangeType::new(min, max))))
    }

    /// Resolve `expr` and require an integer literal
    fn fold_const(&mut self, expr: ExprId) -> Result<(ExprId, i64)> {
        let folded = self.resolve_expr(expr)?;
        match self.program.literal(folded) {
            Some(Literal::Int(value)) => Ok((folded, *value)),
            Some(_) => Err(self.expr_error(expr, ErrorKind::type_mismatch("integer", self.describe_expr(folded)))),
            None => Err(self.expr_error(expr, ErrorKind::ExpectedConstant)),
        }
    }

    /// Array length: a non-negative 32-bit constant
    fn fold_const_uint(&mut self, expr: ExprId) -> Result<(ExprId, u32)> {
        let (folded, value) = self.fold_const(expr)?;
        if value < 0 {
            return Err(self.expr_error(expr, ErrorKind::ExpectedNonNegativeInteger));
        }
        if value > i32::MAX as i64 {
            return Err(self.expr_error(expr, ErrorKind::IntegerTooBig));
        }
        Ok((folded, value as u32))
    }

    fn unexpected_bang(&self, expr: ExprId) -> crate::utils::Error {
        self.expr_error(expr, ErrorKind::invalid_type("unexpected exclamation mark on non-reference type"))
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::{BinaryOp, ConstOwner, Expr, ExprId, Literal, Operand, PostfixOp, PrefixOp, Program};
    use crate::frontend::semantic::resolve;
    use crate::types::Type;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    /// Declare `Probe` as a global constant of the given type expression
    /// and return the resolved type of that expression
    fn resolve_type(build: impl FnOnce(&mut Program) -> (ExprId, ExprId)) -> Result<Type, ErrorKind> {
        let mut program = Program::new();
        let file = program.add_file("types.ci");
        let (ty, value) = build(&mut program);
        program.add_const(ConstOwner::Program(file), 1, "Probe", Some(ty), Some(value));
        resolve(&mut program).map_err(|e| e.kind)?;
        Ok(program.type_of(ty).cloned().unwrap())
    }

    #[test]
    fn test_prefix_ranges() {
        let ty = resolve_type(|p| {
            let ten = p.int(1, 10);
            (p.prefix(1, PrefixOp::Less, ten), p.int(1, 0))
        });
        assert_eq!(ty, Ok(Type::range(0, 9)));

        let ty = resolve_type(|p| {
            let ten = p.int(1, 10);
            (p.prefix(1, PrefixOp::LessOrEqual, ten), p.int(1, 0))
        });
        assert_eq!(ty, Ok(Type::range(0, 10)));
    }

    #[test]
    fn test_infix_ranges() {
        let ty = resolve_type(|p| {
            let one = p.int(1, 1);
            let ten = p.int(1, 10);
            (p.binary(1, BinaryOp::LessOrEqual, one, ten), p.int(1, 5))
        });
        assert_eq!(ty, Ok(Type::range(1, 10)));

        let ty = resolve_type(|p| {
            let min = p.int(1, 5);
            let max = p.int(1, 5);
            (p.binary(1, BinaryOp::Less, min, max), p.int(1, 5))
        });
        assert_eq!(ty, Err(ErrorKind::RangeMinGreaterThanMax { min: 5, max: 4 }));
    }

    #[test]
    fn test_array_lengths() {
        let ty = resolve_type(|p| {
            let byte = p.name(1, "byte");
            let len = p.int(1, -1);
            (p.index(1, byte, Some(len)), p.int(1, 0))
        });
        assert_eq!(ty, Err(ErrorKind::ExpectedNonNegativeInteger));

        let ty = resolve_type(|p| {
            let byte = p.name(1, "byte");
            let len = p.int(1, 1 << 31);
            (p.index(1, byte, Some(len)), p.int(1, 0))
        });
        assert_eq!(ty, Err(ErrorKind::IntegerTooBig));
    }

    #[test]
    fn test_nested_arrays_rightmost_is_innermost() {
        let mut program = Program::new();
        let file = program.add_file("types.ci");
        let class = program.add_class(file, 1, "Grid", None);
        // int[3][]! cells;
        let int = program.name(2, "int");
        let three = program.int(2, 3);
        let storage = program.index(2, int, Some(three));
        let pointer = program.index(2, storage, None);
        let ty = program.postfix(2, PostfixOp::Bang, pointer);
        let field = program.add_field(class, 2, "cells", ty);

        resolve(&mut program).unwrap();
        // three mutable pointers to int arrays
        let pointer = Type::ArrayPointer { element: Box::new(Type::INT), mutable: true };
        assert_eq!(
            program.field(field).ty,
            Some(Type::ArrayStorage { element: Box::new(pointer), length: 3 })
        );
    }

    #[test]
    fn test_every_type_node_is_typed() {
        // class Grid { byte[2 + 3] cells; Grid! next; }
        let mut program = Program::new();
        let file = program.add_file("types.ci");
        let class = program.add_class(file, 1, "Grid", None);
        let byte = program.name(2, "byte");
        let two = program.int(2, 2);
        let three = program.int(2, 3);
        let length = program.binary(2, BinaryOp::Add, two, three);
        let cells = program.index(2, byte, Some(length));
        program.add_field(class, 2, "cells", cells);
        let grid = program.name(3, "Grid");
        let next = program.postfix(3, PostfixOp::Bang, grid);
        program.add_field(class, 3, "next", next);

        resolve(&mut program).unwrap();

        let array = Type::ArrayStorage { element: Box::new(Type::range(0, 255)), length: 5 };
        assert_eq!(program.type_of(cells), Some(&array));
        assert_eq!(program.type_of(byte), Some(&Type::range(0, 255)));
        let Expr::Binary { right: Operand::Expr(folded), .. } = &program.expr(cells).kind else {
            panic!("not an index")
        };
        assert_eq!(program.literal(*folded), Some(&Literal::Int(5)));
        assert_eq!(program.type_of(*folded), Some(&Type::range(5, 5)));

        let pointer = Type::ClassPointer { class, mutable: true };
        assert_eq!(program.type_of(next), Some(&pointer));
        assert_eq!(program.type_of(grid), Some(&pointer));
    }

    #[test]
    fn test_class_pointer_and_storage() {
        let mut program = Program::new();
        let file = program.add_file("types.ci");
        let node = program.add_class(file, 1, "Node", None);
        let name = program.name(2, "Node");
        let next_ty = program.postfix(2, PostfixOp::Bang, name);
        let next = program.add_field(node, 2, "next", next_ty);
        let text = program.name(3, "string");
        let text_ty = program.call(3, text, vec![]);
        let label = program.add_field(node, 3, "label", text_ty);

        resolve(&mut program).unwrap();
        assert_eq!(program.field(next).ty, Some(Type::ClassPointer { class: node, mutable: true }));
        assert_eq!(program.field(label).ty, Some(Type::StringStorage));
    }

    #[test]
    fn test_bang_on_value_type() {
        let ty = resolve_type(|p| {
            let int = p.name(1, "int");
            (p.postfix(1, PostfixOp::Bang, int), p.int(1, 0))
        });
        assert!(matches!(ty, Err(ErrorKind::InvalidType { .. })));
    }

    #[test]
    fn test_other_shapes_are_invalid() {
        let ty = resolve_type(|p| {
            let a = p.int(1, 1);
            let b = p.int(1, 2);
            (p.binary(1, BinaryOp::Add, a, b), p.int(1, 0))
        });
        assert!(matches!(ty, Err(ErrorKind::InvalidType { .. })));
    }
}
