//! Class hierarchy linearization

use log::debug;

use super::scope::ScopeId;
use super::Resolver;
use crate::frontend::ast::{ClassId, Symbol};
use crate::utils::{ErrorKind, Result};

impl Resolver<'_> {
    /// Link `class` to its base, resolving bases first, and append it to
    /// the program's base-before-derived class list
    pub(super) fn resolve_class(&mut self, class: ClassId) -> Result<()> {
        let file = self.program.class(class).file;
        let scope = self.class_scopes[class.index()];
        self.with_context(file, scope, |r| r.resolve_once(class, |r| r.link_class(class)))
    }

    fn link_class(&mut self, class: ClassId) -> Result<()> {
        let (line, base_name) = {
            let c = self.program.class(class);
            (c.line, c.base_name.clone())
        };
        if let Some(name) = base_name {
            let base = match self.symbols.lookup_from(ScopeId::PROGRAM, &name) {
                Some(Symbol::Class(base)) => *base,
                _ => return Err(self.error(line, ErrorKind::BaseClassNotFound { name })),
            };
            self.program.class_mut(class).base = Some(base);
            self.resolve_class(base)?;
            self.symbols.set_parent(self.class_scopes[class.index()], self.class_scopes[base.index()]);
        }
        debug!("class {} resolved", self.program.class(class).name);
        self.program.ordered.push(class);
        self.populate_class_scope(class)
    }

    /// Register the class's own constants, fields and methods
    fn populate_class_scope(&mut self, class: ClassId) -> Result<()> {
        let scope = self.class_scopes[class.index()];
        let c = self.program.class(class);
        let mut members = Vec::new();
        for &konst in &c.consts {
            let konst_ref = self.program.constant(konst);
            members.push((konst_ref.name.clone(), konst_ref.line, Symbol::Const(konst)));
        }
        for &field in &c.fields {
            let field_ref = self.program.field(field);
            members.push((field_ref.name.clone(), field_ref.line, Symbol::Field(field)));
        }
        for &method in &c.methods {
            let method_ref = self.program.method(method);
            members.push((method_ref.name.clone(), method_ref.line, Symbol::Method(method)));
        }
        for (name, line, symbol) in members {
            self.symbols
                .define_in(scope, &name, symbol)
                .map_err(|kind| self.error(line, kind))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::{ClassId, Program, VisitStatus};
    use crate::frontend::semantic::resolve;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    fn classes(pairs: &[(&str, Option<&str>)]) -> Program {
        let mut program = Program::new();
        let file = program.add_file("shapes.ci");
        for (i, (name, base)) in pairs.iter().enumerate() {
            program.add_class(file, i as u32 + 1, name, *base);
        }
        program
    }

    #[test]
    fn test_bases_come_first() {
        let mut program = classes(&[("Square", Some("Rect")), ("Rect", Some("Shape")), ("Shape", None)]);
        resolve(&mut program).unwrap();
        assert_eq!(program.ordered, vec![ClassId(2), ClassId(1), ClassId(0)]);
        assert_eq!(program.class(ClassId(0)).base, Some(ClassId(1)));
        assert!(program.classes.iter().all(|c| c.status == VisitStatus::Resolved));
    }

    #[test]
    fn test_missing_base() {
        let mut program = classes(&[("Square", Some("Rect"))]);
        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BaseClassNotFound { name: "Rect".into() });
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_mutual_inheritance_fails_in_either_order() {
        for pairs in [[("A", Some("B")), ("B", Some("A"))], [("B", Some("A")), ("A", Some("B"))]] {
            let mut program = classes(&pairs);
            let err = resolve(&mut program).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::CircularInheritance { .. }), "{err}");
        }
    }

    #[test]
    fn test_self_inheritance() {
        let mut program = classes(&[("Loop", Some("Loop"))]);
        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CircularInheritance { name: "Loop".into() });
    }

    #[test]
    fn test_duplicate_member() {
        let mut program = classes(&[("Point", None)]);
        let a = program.name(2, "int");
        let b = program.name(3, "int");
        program.add_field(ClassId(0), 2, "x", a);
        program.add_field(ClassId(0), 3, "x", b);
        let err = resolve(&mut program).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateSymbol { name: "x".into() });
        assert_eq!(err.line, 3);
    }
}
