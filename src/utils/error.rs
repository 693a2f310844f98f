//! Error handling for the Ci resolver

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong during resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // ==================== Name Resolution ====================

    #[error("{name} not found")]
    SymbolNotFound { name: String },

    #[error("Base class {name} not found")]
    BaseClassNotFound { name: String },

    #[error("Circular inheritance for class {name}")]
    CircularInheritance { name: String },

    #[error("Circular dependency in value of constant {name}")]
    CircularConstant { name: String },

    #[error("Duplicate symbol {name}")]
    DuplicateSymbol { name: String },

    // ==================== Types ====================

    #[error("Expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid type: {reason}")]
    InvalidType { reason: String },

    #[error("Integer too big")]
    IntegerTooBig,

    #[error("Expected non-negative integer")]
    ExpectedNonNegativeInteger,

    #[error("Expected constant value")]
    ExpectedConstant,

    #[error("Range min {min} greater than max {max}")]
    RangeMinGreaterThanMax { min: i64, max: i64 },

    // ==================== Expressions ====================

    #[error("Modulo by zero")]
    ModuloByZero,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Index is not 32-bit")]
    IndexNotInt32,

    #[error("Expected {expected} arguments, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    #[error("Invalid expression: {reason}")]
    InvalidExpression { reason: String },

    #[error("Invalid statement: {reason}")]
    InvalidStatement { reason: String },
}

impl ErrorKind {
    pub fn type_mismatch(expected: impl ToString, got: impl ToString) -> Self {
        Self::TypeMismatch { expected: expected.to_string(), got: got.to_string() }
    }

    pub fn invalid_type(reason: impl Into<String>) -> Self {
        Self::InvalidType { reason: reason.into() }
    }

    pub fn invalid_expression(reason: impl Into<String>) -> Self {
        Self::InvalidExpression { reason: reason.into() }
    }

    /// Stable diagnostic code for machine-readable reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::SymbolNotFound { .. } => "E0001",
            Self::BaseClassNotFound { .. } => "E0002",
            Self::CircularInheritance { .. } => "E0003",
            Self::CircularConstant { .. } => "E0004",
            Self::DuplicateSymbol { .. } => "E0005",
            Self::TypeMismatch { .. } => "E0100",
            Self::InvalidType { .. } => "E0101",
            Self::IntegerTooBig => "E0102",
            Self::ExpectedNonNegativeInteger => "E0103",
            Self::ExpectedConstant => "E0104",
            Self::RangeMinGreaterThanMax { .. } => "E0105",
            Self::ModuloByZero => "E0200",
            Self::DivisionByZero => "E0201",
            Self::IndexNotInt32 => "E0202",
            Self::ArgumentCountMismatch { .. } => "E0203",
            Self::InvalidExpression { .. } => "E0204",
            Self::InvalidStatement { .. } => "E0205",
        }
    }
}

/// Resolution error with the source location it was raised at
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}:{}: {}", file.display(), line, kind)]
pub struct Error {
    pub file: PathBuf,
    /// 1-based line number
    pub line: u32,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(file: impl Into<PathBuf>, line: u32, kind: ErrorKind) -> Self {
        Self { file: file.into(), line, kind }
    }
}
