//! Structured Feedback Module
//!
//! Machine-readable output for tools driving the resolver:
//! - JSON error reports with stable codes
//! - A summary of the resolved class hierarchy

use serde::{Deserialize, Serialize};

use crate::frontend::ast::Program;
use crate::utils::Error;

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0001")
    pub code: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        let location = (error.line > 0).then(|| Location {
            file: error.file.display().to_string(),
            line: error.line,
        });
        Self {
            code: error.kind.code().to_string(),
            severity: Severity::Error,
            message: error.kind.to_string(),
            location,
        }
    }
}

impl ErrorReport {
    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ==================== Resolution Summary ====================

/// What the resolver produced, for a successful `check`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub success: bool,
    pub files: Vec<String>,
    /// Classes in base-before-derived order
    pub classes: Vec<ClassSummary>,
    pub enums: Vec<String>,
    pub global_consts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    pub base: Option<String>,
    pub consts: usize,
    pub fields: usize,
    pub methods: usize,
}

impl ResolutionSummary {
    /// Summarize a program that has been through `resolve`
    pub fn new(program: &Program) -> Self {
        let classes = program
            .ordered
            .iter()
            .map(|&id| {
                let class = program.class(id);
                ClassSummary {
                    name: class.name.clone(),
                    base: class.base.map(|base| program.class(base).name.clone()),
                    consts: class.consts.len(),
                    fields: class.fields.len(),
                    methods: class.methods.len(),
                }
            })
            .collect();
        Self {
            success: true,
            files: program.files.iter().map(|f| f.display().to_string()).collect(),
            classes,
            enums: program.enums.iter().map(|e| e.name.clone()).collect(),
            global_consts: program.globals.len(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
