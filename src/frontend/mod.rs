//! Frontend module - AST and Semantic Resolution

pub mod ast;
pub mod semantic;
