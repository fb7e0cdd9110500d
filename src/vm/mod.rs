//! VM command model and `.vm` text parsing.
//!
//! A program is an ordered list of [`SourceUnit`]s, each the parsed contents of
//! one `.vm` file. Commands are immutable once parsed.
//!
//! # VM Format
//!
//! ```text
//! // Comments start with two slashes
//! function Main.double 0
//!     push argument 0
//!     push argument 0
//!     add
//!     return
//! ```

use std::fmt;

pub use crate::core::segment::Segment;

pub mod parser;

pub use parser::{parse_program, parse_unit};

/// Stack arithmetic, logic and comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 9] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Neg,
        ArithmeticOp::Eq,
        ArithmeticOp::Gt,
        ArithmeticOp::Lt,
        ArithmeticOp::And,
        ArithmeticOp::Or,
        ArithmeticOp::Not,
    ];

    pub const fn keyword(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        ArithmeticOp::ALL.into_iter().find(|op| op.keyword() == s)
    }

    pub const fn is_comparison(self) -> bool {
        matches!(self, ArithmeticOp::Eq | ArithmeticOp::Gt | ArithmeticOp::Lt)
    }
}

/// One VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { function: String, args: u16 },
    Return,
}

impl Command {
    /// Short name of the command kind, used for statistics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Push { .. } => "push",
            Command::Pop { .. } => "pop",
            Command::Arithmetic(op) => op.keyword(),
            Command::Label(_) => "label",
            Command::Goto(_) => "goto",
            Command::IfGoto(_) => "if-goto",
            Command::Function { .. } => "function",
            Command::Call { .. } => "call",
            Command::Return => "return",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push { segment, index } => write!(f, "push {segment} {index}"),
            Command::Pop { segment, index } => write!(f, "pop {segment} {index}"),
            Command::Arithmetic(op) => f.write_str(op.keyword()),
            Command::Label(name) => write!(f, "label {name}"),
            Command::Goto(name) => write!(f, "goto {name}"),
            Command::IfGoto(name) => write!(f, "if-goto {name}"),
            Command::Function { name, locals } => write!(f, "function {name} {locals}"),
            Command::Call { function, args } => write!(f, "call {function} {args}"),
            Command::Return => f.write_str("return"),
        }
    }
}

/// The commands of one `.vm` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Logical name; qualifies statics and function labels.
    pub name: String,
    pub commands: Vec<Command>,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }
}

/// Every source unit of one program, in translation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub units: Vec<SourceUnit>,
}

impl Program {
    pub fn new(units: Vec<SourceUnit>) -> Self {
        Self { units }
    }

    pub fn push_unit(&mut self, unit: SourceUnit) {
        self.units.push(unit);
    }

    /// Total number of commands across all units.
    pub fn command_count(&self) -> usize {
        self.units.iter().map(|unit| unit.commands.len()).sum()
    }
}
