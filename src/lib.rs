//! vmtrans - VM-to-Hack translation.
//!
//! vmtrans lowers the commands of a stack virtual machine into assembly for the
//! 16-bit Hack platform. Besides the stack and memory-segment commands it
//! implements a full call/return ABI, per-function label scoping and a
//! bootstrap, and it shares one copy of the call, return and comparison logic
//! across every call site to keep programs small.
//!
//! # Primary Usage
//!
//! ```no_run
//! use vmtrans::{parse_program, Translator, TranslatorConfig};
//!
//! let program = parse_program([
//!     ("Sys", "function Sys.init 0\ncall Main.main 0\nlabel HALT\ngoto HALT"),
//!     ("Main", "function Main.main 0\npush constant 7\nreturn"),
//! ])?;
//! let output = Translator::new(TranslatorConfig::default()).translate(&program)?;
//! print!("{}", output.to_asm());
//! # Ok::<(), vmtrans::TranslateError>(())
//! ```
//!
//! # Architecture
//!
//! - [`vm`] - Command model and `.vm` text parser
//! - [`core`] - Shared infrastructure (segments, labels, session, errors)
//! - [`hack`] - Hack instruction model and the per-command generators
//! - [`translator`] - Whole-program driver and configuration

pub mod core;
pub mod hack;
pub mod translator;
pub mod vm;

// Re-export common types from organized modules
pub use self::core::{
    // Segments and fixed cells
    Location, MachineReg, Segment,
    // Naming
    LabelAllocator, Scope,
    // Session management
    SessionStats, TranslationSession,
    // Errors
    TranslateError, TranslateResult,
};
pub use hack::{write_asm, Instruction, SharedRoutine};
pub use translator::{TranslationOutput, Translator, TranslatorConfig};
pub use vm::{parse_program, parse_unit, ArithmeticOp, Command, Program, SourceUnit};
