// This module defines the abstract Hack instruction set the generators emit. An Instruction
// is either an A-instruction (`@value`, loading a constant, a predefined register symbol or
// a label/variable symbol into A), a C-instruction (`dest=comp;jump`, with every one of the
// 28 computations the ALU supports) or a zero-width label declaration `(NAME)`. Dest, Comp
// and Jump are closed enums so an illegal computation such as `M+D+1` cannot be expressed.
// Display renders canonical Hack assembly text, and write_asm streams a whole program.

//! Hack instruction model and assembly text output.

use std::fmt;
use std::io::{self, Write};

use crate::core::register_file::MachineReg;

/// Operand of an A-instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Literal in `0..=32767`.
    Constant(u16),
    /// Predefined register symbol such as `SP` or `R13`.
    Register(MachineReg),
    /// Label or variable symbol.
    Symbol(String),
}

/// Destination of a C-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    None,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

/// ALU computation of a C-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

/// Jump condition of a C-instruction, tested against the computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    None,
    Jgt,
    Jeq,
    Jge,
    Jlt,
    Jne,
    Jle,
    Jmp,
}

/// One Hack assembly instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `@operand`
    Address(Operand),
    /// `dest=comp;jump`
    Compute { dest: Dest, comp: Comp, jump: Jump },
    /// `(symbol)`, occupies no ROM word.
    Label(String),
}

impl Dest {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Dest::None => "",
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        }
    }

    pub const fn writes_a(self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    pub const fn writes_d(self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    pub const fn writes_m(self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }
}

impl Comp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Comp::Zero => "0",
            Comp::One => "1",
            Comp::MinusOne => "-1",
            Comp::D => "D",
            Comp::A => "A",
            Comp::M => "M",
            Comp::NotD => "!D",
            Comp::NotA => "!A",
            Comp::NotM => "!M",
            Comp::NegD => "-D",
            Comp::NegA => "-A",
            Comp::NegM => "-M",
            Comp::DPlusOne => "D+1",
            Comp::APlusOne => "A+1",
            Comp::MPlusOne => "M+1",
            Comp::DMinusOne => "D-1",
            Comp::AMinusOne => "A-1",
            Comp::MMinusOne => "M-1",
            Comp::DPlusA => "D+A",
            Comp::DPlusM => "D+M",
            Comp::DMinusA => "D-A",
            Comp::DMinusM => "D-M",
            Comp::AMinusD => "A-D",
            Comp::MMinusD => "M-D",
            Comp::DAndA => "D&A",
            Comp::DAndM => "D&M",
            Comp::DOrA => "D|A",
            Comp::DOrM => "D|M",
        }
    }

    /// Whether the computation reads `M` (`RAM[A]`).
    pub const fn reads_memory(self) -> bool {
        matches!(
            self,
            Comp::M
                | Comp::NotM
                | Comp::NegM
                | Comp::MPlusOne
                | Comp::MMinusOne
                | Comp::DPlusM
                | Comp::DMinusM
                | Comp::MMinusD
                | Comp::DAndM
                | Comp::DOrM
        )
    }
}

impl Jump {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Jump::None => "",
            Jump::Jgt => "JGT",
            Jump::Jeq => "JEQ",
            Jump::Jge => "JGE",
            Jump::Jlt => "JLT",
            Jump::Jne => "JNE",
            Jump::Jle => "JLE",
            Jump::Jmp => "JMP",
        }
    }

    /// Whether a jump with this condition is taken for `value`.
    pub const fn taken(self, value: i16) -> bool {
        match self {
            Jump::None => false,
            Jump::Jgt => value > 0,
            Jump::Jeq => value == 0,
            Jump::Jge => value >= 0,
            Jump::Jlt => value < 0,
            Jump::Jne => value != 0,
            Jump::Jle => value <= 0,
            Jump::Jmp => true,
        }
    }
}

impl Instruction {
    /// Whether this instruction occupies a ROM word.
    pub fn is_code(&self) -> bool {
        !matches!(self, Instruction::Label(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{value}"),
            Operand::Register(reg) => write!(f, "{reg}"),
            Operand::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Address(operand) => write!(f, "@{operand}"),
            Instruction::Label(symbol) => write!(f, "({symbol})"),
            Instruction::Compute { dest, comp, jump } => {
                if *dest != Dest::None {
                    write!(f, "{}=", dest.mnemonic())?;
                }
                f.write_str(comp.mnemonic())?;
                if *jump != Jump::None {
                    write!(f, ";{}", jump.mnemonic())?;
                }
                Ok(())
            }
        }
    }
}

/// Number of ROM words `instructions` occupy.
pub fn code_size(instructions: &[Instruction]) -> usize {
    instructions.iter().filter(|inst| inst.is_code()).count()
}

/// Write `instructions` as Hack assembly, one per line.
pub fn write_asm<W: Write>(out: &mut W, instructions: &[Instruction]) -> io::Result<()> {
    for inst in instructions {
        writeln!(out, "{inst}")?;
    }
    Ok(())
}

/// Render `instructions` as a single assembly string.
pub fn to_asm(instructions: &[Instruction]) -> String {
    let mut text = String::new();
    for inst in instructions {
        text.push_str(&inst.to_string());
        text.push('\n');
    }
    text
}
