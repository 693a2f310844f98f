//! Ci semantic resolver
//!
//! Takes the untyped AST produced by the Ci parser and resolves it:
//! names are bound, classes are ordered base-first, constants are folded
//! and every expression gets a type, with integers tracked as ranges.

pub mod feedback;
pub mod frontend;
pub mod types;
pub mod utils;

pub use frontend::ast::Program;
pub use frontend::semantic::resolve;
pub use utils::{Error, ErrorKind, Result};
