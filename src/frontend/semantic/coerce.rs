//! Widening-only coercion

use super::Resolver;
use crate::frontend::ast::{ExprId, Program};
use crate::types::Type;
use crate::utils::{ErrorKind, Result};

/// `true` if a value of type `got` may be stored where `expected` is required
pub fn is_assignable(program: &Program, got: &Type, expected: &Type) -> bool {
    if got == expected {
        return true;
    }
    match (got, expected) {
        (Type::Range(got), Type::Range(expected)) => expected.contains(got),
        (_, Type::Floating(_)) if *expected == Type::DOUBLE => got.is_numeric(),
        (_, Type::Floating(_)) => got.is_numeric() && *got != Type::DOUBLE,
        (_, Type::Integer(_)) if *expected == Type::LONG => got.is_integer(),
        (_, Type::Integer(_)) => got.is_integer() && !got.is_long(),
        (Type::StringStorage, Type::StringPointer) => true,
        (Type::Null, _) => expected.is_nullable(),
        (
            Type::ClassPointer { class: derived, mutable: got_mutable },
            Type::ClassPointer { class, mutable },
        ) => program.derives_from(*derived, *class) && (*got_mutable || !*mutable),
        (Type::ClassStorage(derived), Type::ClassPointer { class, .. }) => program.derives_from(*derived, *class),
        (Type::ArrayStorage { element: got, .. }, Type::ArrayPointer { element, .. }) => got == element,
        (
            Type::ArrayPointer { element: got, mutable: got_mutable },
            Type::ArrayPointer { element, mutable },
        ) => got == element && (*got_mutable || !*mutable),
        (
            Type::ArrayStorage { element: got, length: got_length },
            Type::ArrayStorage { element, length },
        ) => got_length == length && is_assignable(program, got, element),
        _ => false,
    }
}

impl Resolver<'_> {
    /// Check that the resolved `expr` fits `expected`
    pub(super) fn coerce(&self, expr: ExprId, expected: &Type) -> Result<()> {
        let got = self.expr_type(expr);
        if is_assignable(self.program, &got, expected) {
            return Ok(());
        }
        let kind = ErrorKind::type_mismatch(self.program.describe(expected), self.program.describe(&got));
        Err(self.expr_error(expr, kind))
    }

    /// Resolve a condition
    pub(super) fn resolve_bool(&mut self, expr: ExprId) -> Result<ExprId> {
        let expr = self.resolve_expr(expr)?;
        self.coerce(expr, &Type::Bool)?;
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with_classes() -> (Program, crate::frontend::ast::ClassId, crate::frontend::ast::ClassId) {
        let mut program = Program::new();
        let file = program.add_file("a.ci");
        let shape = program.add_class(file, 1, "Shape", None);
        let circle = program.add_class(file, 2, "Circle", Some("Shape"));
        program.class_mut(circle).base = Some(shape);
        (program, shape, circle)
    }

    #[test]
    fn test_numeric_widening() {
        let program = Program::new();
        let byte = Type::range(0, 255);
        assert!(is_assignable(&program, &byte, &Type::INT));
        assert!(is_assignable(&program, &byte, &Type::LONG));
        assert!(is_assignable(&program, &Type::INT, &Type::DOUBLE));
        assert!(is_assignable(&program, &Type::LONG, &Type::FLOAT));
        assert!(is_assignable(&program, &Type::Char, &Type::INT));
        assert!(!is_assignable(&program, &Type::DOUBLE, &Type::FLOAT));
        assert!(!is_assignable(&program, &Type::LONG, &Type::INT));
        assert!(!is_assignable(&program, &Type::range(0, 1 << 32), &Type::INT));
        assert!(!is_assignable(&program, &Type::FLOAT, &Type::LONG));
    }

    #[test]
    fn test_ranges_must_be_contained() {
        let program = Program::new();
        assert!(is_assignable(&program, &Type::range(3, 3), &Type::range(0, 255)));
        assert!(!is_assignable(&program, &Type::range(-1, 3), &Type::range(0, 255)));
        assert!(!is_assignable(&program, &Type::INT, &Type::range(0, 255)));
    }

    #[test]
    fn test_no_string_conversions() {
        let program = Program::new();
        assert!(is_assignable(&program, &Type::StringStorage, &Type::StringPointer));
        assert!(!is_assignable(&program, &Type::StringPointer, &Type::StringStorage));
        assert!(!is_assignable(&program, &Type::INT, &Type::StringPointer));
        assert!(!is_assignable(&program, &Type::StringPointer, &Type::INT));
    }

    #[test]
    fn test_class_pointers() {
        let (program, shape, circle) = program_with_classes();
        let ptr = |class, mutable| Type::ClassPointer { class, mutable };
        assert!(is_assignable(&program, &ptr(circle, false), &ptr(shape, false)));
        assert!(is_assignable(&program, &ptr(circle, true), &ptr(shape, false)));
        assert!(!is_assignable(&program, &ptr(circle, false), &ptr(shape, true)));
        assert!(!is_assignable(&program, &ptr(shape, false), &ptr(circle, false)));
        assert!(is_assignable(&program, &Type::ClassStorage(circle), &ptr(shape, true)));
        assert!(is_assignable(&program, &Type::Null, &ptr(shape, true)));
        assert!(!is_assignable(&program, &Type::Null, &Type::ClassStorage(shape)));
    }

    #[test]
    fn test_arrays() {
        let program = Program::new();
        let byte = Box::new(Type::range(0, 255));
        let storage = Type::ArrayStorage { element: byte.clone(), length: 4 };
        let pointer = Type::ArrayPointer { element: byte.clone(), mutable: true };
        let literal = Type::ArrayStorage { element: Box::new(Type::range(1, 3)), length: 4 };
        assert!(is_assignable(&program, &storage, &pointer));
        assert!(is_assignable(&program, &literal, &storage));
        assert!(!is_assignable(&program, &literal, &pointer));
        assert!(!is_assignable(&program, &Type::ArrayPointer { element: byte, mutable: false }, &pointer));
    }
}
