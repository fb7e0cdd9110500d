// This module is the segment model: static knowledge of how each VM memory segment maps to
// RAM. Pointer segments (local, argument, this, that) keep their base address in a machine
// cell that must be dereferenced before the index is added. Fixed segments (pointer, temp)
// have a constant base, so `segment i` names one fixed machine cell. The constant segment
// is an immediate with no memory behind it, and the static segment maps each (unit, index)
// pair to one assembler variable named after the unit. Resolution is pure: the same input
// always yields the same location, which is what keeps static naming stable across a
// whole translation.

//! Segment model: resolution of `segment index` to a machine location.

use std::fmt;

use thiserror::Error;

use super::register_file::{MachineReg, MAX_IMMEDIATE, TEMP_SIZE};

/// A VM memory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Constant,
    Static,
}

/// Where a `segment index` pair lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `RAM[RAM[base] + offset]`: the base cell must be dereferenced first.
    Indirect { base: MachineReg, offset: u16 },
    /// A fixed machine cell.
    Direct(MachineReg),
    /// A literal value; no memory access.
    Immediate(u16),
    /// An assembler variable unique to one source unit and index.
    Static(String),
}

/// Reasons a segment index cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("{segment} index {index} is out of range 0..={max}")]
    IndexOutOfRange {
        segment: Segment,
        index: u16,
        max: u16,
    },
}

impl Segment {
    /// All segments, in keyword order.
    pub const ALL: [Segment; 8] = [
        Segment::Local,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Pointer,
        Segment::Temp,
        Segment::Constant,
        Segment::Static,
    ];

    /// Keyword used for this segment in VM source.
    pub const fn keyword(self) -> &'static str {
        match self {
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Constant => "constant",
            Segment::Static => "static",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Segment::ALL.into_iter().find(|seg| seg.keyword() == s)
    }

    /// Largest legal index for this segment.
    pub const fn max_index(self) -> u16 {
        match self {
            Segment::Pointer => 1,
            Segment::Temp => TEMP_SIZE - 1,
            // Offsets and constants are loaded with a single A-instruction.
            Segment::Constant
            | Segment::Local
            | Segment::Argument
            | Segment::This
            | Segment::That
            | Segment::Static => MAX_IMMEDIATE,
        }
    }

    /// Resolve `self index` inside source unit `unit`.
    pub fn resolve(self, index: u16, unit: &str) -> Result<Location, SegmentError> {
        if index > self.max_index() {
            return Err(SegmentError::IndexOutOfRange {
                segment: self,
                index,
                max: self.max_index(),
            });
        }

        let indirect = |base| Location::Indirect { base, offset: index };
        let location = match self {
            Segment::Local => indirect(MachineReg::Lcl),
            Segment::Argument => indirect(MachineReg::Arg),
            Segment::This => indirect(MachineReg::This),
            Segment::That => indirect(MachineReg::That),
            Segment::Pointer if index == 0 => Location::Direct(MachineReg::This),
            Segment::Pointer => Location::Direct(MachineReg::That),
            Segment::Temp => Location::Direct(MachineReg::Temp(index as u8)),
            Segment::Constant => Location::Immediate(index),
            Segment::Static => Location::Static(static_symbol(unit, index)),
        };
        Ok(location)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Assembler variable backing `static index` of `unit`.
pub fn static_symbol(unit: &str, index: u16) -> String {
    format!("{unit}.{index}")
}
