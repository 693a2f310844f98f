//! Type System for Ci

use serde::{Deserialize, Serialize};

use super::range::RangeType;
use crate::frontend::ast::{ClassId, EnumId};

/// Fixed-width integer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegerType {
    Int32,
    Int64,
}

/// Floating-point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatingType {
    Float,
    Double,
}

/// Resolved type of an expression or declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Void,
    Null,
    Bool,
    Char,
    Integer(IntegerType),
    Floating(FloatingType),
    /// Integer known to lie within the interval
    Range(RangeType),
    StringPointer,
    StringStorage,
    ArrayPointer { element: Box<Type>, mutable: bool },
    ArrayStorage { element: Box<Type>, length: u32 },
    ClassPointer { class: ClassId, mutable: bool },
    ClassStorage(ClassId),
    Enum(EnumId),
}

impl Type {
    pub const INT: Self = Self::Integer(IntegerType::Int32);
    pub const LONG: Self = Self::Integer(IntegerType::Int64);
    pub const FLOAT: Self = Self::Floating(FloatingType::Float);
    pub const DOUBLE: Self = Self::Floating(FloatingType::Double);

    pub fn range(min: i64, max: i64) -> Self {
        Self::Range(RangeType::new(min, max))
    }

    /// Type of `string.Length` and other non-negative 32-bit counts
    pub fn length() -> Self {
        Self::range(0, i32::MAX as i64)
    }

    pub fn as_range(&self) -> Option<RangeType> {
        match self {
            Self::Range(range) => Some(*range),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Range(_) | Self::Char)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// Integer that does not fit in 32 bits
    pub fn is_long(&self) -> bool {
        match self {
            Self::Integer(IntegerType::Int64) => true,
            Self::Range(range) => !range.fits_i32(),
            _ => false,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::StringPointer | Self::StringStorage)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::ArrayPointer { .. } | Self::ArrayStorage { .. })
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Self::ArrayPointer { element, .. } | Self::ArrayStorage { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Class whose members are reachable through `.`
    pub fn class(&self) -> Option<ClassId> {
        match self {
            Self::ClassPointer { class, .. } | Self::ClassStorage(class) => Some(*class),
            _ => None,
        }
    }

    /// Result type of integer-only operators on non-range operands
    pub fn integer_result(left: &Type, right: &Type) -> Type {
        if left.is_long() || right.is_long() {
            Type::LONG
        } else {
            Type::INT
        }
    }

    /// Result type of arithmetic on non-range operands
    pub fn numeric_result(left: &Type, right: &Type) -> Type {
        if left.is_floating() || right.is_floating() {
            Type::DOUBLE
        } else {
            Type::integer_result(left, right)
        }
    }

    /// Common type of two values flowing into one slot (array items,
    /// conditional branches)
    pub fn unify(left: &Type, right: &Type) -> Option<Type> {
        if left == right {
            return Some(left.clone());
        }
        match (left, right) {
            (Type::Range(a), Type::Range(b)) => Some(Type::Range(a.union(*b))),
            // integers of different kinds do not mix without a floating side
            (a, b) if a.is_numeric() && b.is_numeric() && (a.is_floating() || b.is_floating()) => {
                if *a == Type::DOUBLE || *b == Type::DOUBLE {
                    Some(Type::DOUBLE)
                } else {
                    Some(Type::FLOAT)
                }
            }
            (Type::Null, other) | (other, Type::Null) if other.is_nullable() => Some(other.clone()),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Self::StringPointer | Self::ArrayPointer { .. } | Self::ClassPointer { .. }
        )
    }
}
