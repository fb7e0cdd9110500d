//! Fixed-purpose machine cells of the Hack platform.
//!
//! The Hack CPU only has the A and D registers. Everything the VM needs beyond
//! that (the stack pointer, the segment base registers, the temp segment and
//! the scratch cells used by the shared routines) lives at fixed low RAM
//! addresses. This module names every one of them so that generators never
//! spell out a raw address.

use std::fmt;

/// Lowest RAM address of the temp segment (`R5`).
pub const TEMP_BASE: u16 = 5;

/// Number of cells in the temp segment (`R5`..=`R12`).
pub const TEMP_SIZE: u16 = 8;

/// First RAM address the assembler hands out to variables (static cells).
pub const STATIC_BASE: u16 = 16;

/// Number of static cells that fit below the stack (`16..=255`).
pub const STATIC_LIMIT: usize = 240;

/// Default initial value of `SP` established by the bootstrap.
pub const STACK_BASE: u16 = 256;

/// Largest value an A-instruction can load (15-bit immediate).
pub const MAX_IMMEDIATE: u16 = 0x7FFF;

/// A named, fixed-address RAM cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineReg {
    /// Stack pointer: address of the next free stack cell.
    Sp,
    /// Base of the current function's local segment.
    Lcl,
    /// Base of the current function's argument segment.
    Arg,
    /// Base of the `this` segment; also `pointer 0`.
    This,
    /// Base of the `that` segment; also `pointer 1`.
    That,
    /// Temp segment cell `temp i`, stored at `R5 + i`.
    Temp(u8),
    /// Scratch cell.
    R13,
    /// Scratch cell.
    R14,
    /// Scratch cell.
    R15,
}

impl MachineReg {
    /// Argument count handed to the shared call routine.
    pub const CALL_ARG_COUNT: MachineReg = MachineReg::R13;
    /// Callee entry address handed to the shared call routine.
    pub const CALL_TARGET: MachineReg = MachineReg::R14;
    /// Return address saved by the shared return routine before teardown.
    pub const RETURN_ADDRESS: MachineReg = MachineReg::R13;
    /// Frame walker used by the shared return routine.
    pub const FRAME: MachineReg = MachineReg::R14;
    /// Return address of a comparison routine. Used by nothing else.
    pub const COMPARE_RETURN: MachineReg = MachineReg::R15;

    /// Base registers saved in a call frame, in push order.
    pub const SAVED_BASES: [MachineReg; 4] = [
        MachineReg::Lcl,
        MachineReg::Arg,
        MachineReg::This,
        MachineReg::That,
    ];

    /// RAM address of this cell.
    pub const fn address(self) -> u16 {
        match self {
            MachineReg::Sp => 0,
            MachineReg::Lcl => 1,
            MachineReg::Arg => 2,
            MachineReg::This => 3,
            MachineReg::That => 4,
            MachineReg::Temp(i) => TEMP_BASE + i as u16,
            MachineReg::R13 => 13,
            MachineReg::R14 => 14,
            MachineReg::R15 => 15,
        }
    }

    /// Predefined assembler symbol naming this cell.
    pub fn symbol(self) -> String {
        match self {
            MachineReg::Sp => "SP".to_string(),
            MachineReg::Lcl => "LCL".to_string(),
            MachineReg::Arg => "ARG".to_string(),
            MachineReg::This => "THIS".to_string(),
            MachineReg::That => "THAT".to_string(),
            other => format!("R{}", other.address()),
        }
    }
}

impl fmt::Display for MachineReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_match_platform_layout() {
        assert_eq!(MachineReg::Sp.address(), 0);
        assert_eq!(MachineReg::That.address(), 4);
        assert_eq!(MachineReg::Temp(0).address(), 5);
        assert_eq!(MachineReg::Temp(7).address(), 12);
        assert_eq!(MachineReg::R15.address(), 15);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(MachineReg::Lcl.to_string(), "LCL");
        assert_eq!(MachineReg::Temp(2).to_string(), "R7");
        assert_eq!(MachineReg::COMPARE_RETURN.to_string(), "R15");
    }

    #[test]
    fn test_scratch_roles_do_not_overlap_compare_return() {
        for reg in [
            MachineReg::CALL_ARG_COUNT,
            MachineReg::CALL_TARGET,
            MachineReg::RETURN_ADDRESS,
            MachineReg::FRAME,
        ] {
            assert_ne!(reg, MachineReg::COMPARE_RETURN);
        }
    }
}
