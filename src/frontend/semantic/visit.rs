//! Three-state cycle detection shared by classes and constants

use super::Resolver;
use crate::frontend::ast::{ClassId, ConstId, Program, VisitStatus};
use crate::utils::{ErrorKind, Result};

/// A declaration resolved at most once per pass
pub(super) trait Tracked: Copy {
    fn status(self, program: &Program) -> VisitStatus;
    fn set_status(self, program: &mut Program, status: VisitStatus);
    /// Line and error reported when resolution re-enters the declaration
    fn cycle(self, program: &Program) -> (u32, ErrorKind);
}

impl Tracked for ClassId {
    fn status(self, program: &Program) -> VisitStatus {
        program.class(self).status
    }

    fn set_status(self, program: &mut Program, status: VisitStatus) {
        program.class_mut(self).status = status;
    }

    fn cycle(self, program: &Program) -> (u32, ErrorKind) {
        let class = program.class(self);
        (class.line, ErrorKind::CircularInheritance { name: class.name.clone() })
    }
}

impl Tracked for ConstId {
    fn status(self, program: &Program) -> VisitStatus {
        program.constant(self).status
    }

    fn set_status(self, program: &mut Program, status: VisitStatus) {
        program.constant_mut(self).status = status;
    }

    fn cycle(self, program: &Program) -> (u32, ErrorKind) {
        let konst = program.constant(self);
        (konst.line, ErrorKind::CircularConstant { name: konst.name.clone() })
    }
}

impl Resolver<'_> {
    /// Run `body` for `item` unless it is already resolved; re-entering an
    /// item still in progress is a cycle
    pub(super) fn resolve_once<T: Tracked>(
        &mut self,
        item: T,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        match item.status(self.program) {
            VisitStatus::Resolved => return Ok(()),
            VisitStatus::InProgress => {
                let (line, kind) = item.cycle(self.program);
                return Err(self.error(line, kind));
            }
            VisitStatus::Unvisited => {}
        }
        item.set_status(self.program, VisitStatus::InProgress);
        body(self)?;
        item.set_status(self.program, VisitStatus::Resolved);
        Ok(())
    }
}
