//! Types and integer range analysis

pub mod range;
mod type_system;

pub use range::{IntOp, IntStorage, RangeType};
pub use type_system::{FloatingType, IntegerType, Type};
