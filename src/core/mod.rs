// This module serves as the central hub for the translator's core infrastructure, the
// target-independent pieces every generator builds on. It exports and organizes: the
// machine register model (named fixed RAM cells and their scratch roles), the segment model
// (resolution of `segment index` to a machine location), label allocation (function entry,
// intra-function and return-address labels plus the static-cell table), the translation
// session (whole-program state threaded through each generator), and the error types.

//! Core translator infrastructure.
//!
//! # Key Components
//!
//! - `register_file`: [`MachineReg`], the fixed cells of the Hack platform
//! - `segment`: [`Segment`] and [`Location`]
//! - `labels`: [`LabelAllocator`] and [`Scope`]
//! - `session`: [`TranslationSession`] and [`SessionStats`]
//! - `error`: [`TranslateError`]

pub mod error;
pub mod labels;
pub mod register_file;
pub mod segment;
pub mod session;

pub use error::{TranslateError, TranslateResult};

pub use labels::{function_entry, validate_symbol, LabelAllocator, Scope, StaticTable};

pub use register_file::{MachineReg, MAX_IMMEDIATE, STACK_BASE, STATIC_LIMIT, TEMP_BASE, TEMP_SIZE};

pub use segment::{static_symbol, Location, Segment, SegmentError};

pub use session::{SessionStats, TranslationSession};
