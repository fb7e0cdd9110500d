//! Hack platform code generation.
//!
//! This module contains everything specific to the Hack target:
//! - The instruction model and assembly text output
//! - The instruction buffer with stack idioms
//! - One generator per VM command family
//! - The call/return convention and the shared routines it relies on

pub mod arithmetic;
pub mod calling_convention;
pub mod control_flow;
pub mod encoder;
pub mod instruction;
pub mod memory;
pub mod routines;

pub use encoder::HackEncoder;
pub use instruction::{code_size, to_asm, write_asm, Comp, Dest, Instruction, Jump, Operand};
pub use routines::{CompareKind, SharedRoutine};

use crate::core::{Scope, TranslateError};

/// Where the command being translated lives: its function and its index
/// within the source unit.
#[derive(Debug, Clone, Copy)]
pub struct CommandSite<'a> {
    pub scope: &'a Scope,
    pub position: usize,
}

impl<'a> CommandSite<'a> {
    pub fn new(scope: &'a Scope, position: usize) -> Self {
        Self { scope, position }
    }

    pub fn unit(&self) -> &str {
        self.scope.unit()
    }

    /// A [`TranslateError::MalformedCommand`] at this site.
    pub fn malformed(&self, reason: impl Into<String>) -> TranslateError {
        TranslateError::malformed(self.scope.unit(), self.position, reason)
    }
}
