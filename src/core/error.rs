// This module defines error types for the VM translator using the thiserror crate for
// idiomatic Rust error handling. TranslateError is the main error enum covering every
// failure the translator can report: malformed commands (operands out of range for their
// segment, pops into the constant segment, illegal symbol names, commands outside any
// function), labels referenced but never declared in their function, duplicate labels,
// function redefinitions across the whole program, a missing bootstrap entry point, calls
// to undefined functions, invalid or duplicate unit names, exhaustion of the static
// segment, unusable configuration values, parse failures and I/O failures. Each variant
// carries enough context (unit name, command position, function or label name) to locate
// the fault. Translation is fail-fast: the first error aborts the build and no partial
// output is produced.

//! Error types for the VM translator.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Main error type for VM translation.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{unit}: command #{position}: {reason}")]
    MalformedCommand {
        unit: String,
        position: usize,
        reason: String,
    },

    #[error("{unit}: label '{label}' is referenced in function '{function}' but never declared there")]
    UnresolvedLabel {
        unit: String,
        function: String,
        label: String,
    },

    #[error("{unit}: label '{label}' is declared twice in function '{function}'")]
    DuplicateLabel {
        unit: String,
        function: String,
        label: String,
    },

    #[error("function '{name}' is defined in '{first_unit}' and again in '{second_unit}'")]
    FunctionRedefinition {
        name: String,
        first_unit: String,
        second_unit: String,
    },

    #[error("entry point '{name}' is not defined in any source unit")]
    MissingEntryPoint { name: String },

    #[error("{unit}: function '{function}' calls undefined function '{callee}'")]
    UndefinedFunction {
        unit: String,
        function: String,
        callee: String,
    },

    #[error("invalid source unit name '{name}': {reason}")]
    InvalidUnitName { name: String, reason: String },

    #[error("source unit '{name}' appears more than once")]
    DuplicateUnit { name: String },

    #[error("{unit}: static {index} exceeds the program-wide limit of {limit} static cells")]
    StaticOverflow {
        unit: String,
        index: u16,
        limit: usize,
    },

    #[error("invalid translator configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("{unit}:{line}: {reason}")]
    Parse {
        unit: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// Build a [`TranslateError::MalformedCommand`].
    pub fn malformed(unit: &str, position: usize, reason: impl Into<String>) -> Self {
        TranslateError::MalformedCommand {
            unit: unit.to_string(),
            position,
            reason: reason.into(),
        }
    }
}

/// Result type alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;
