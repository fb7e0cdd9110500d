// This module implements the memory-access generator: `push segment index` and
// `pop segment index` for every segment kind. Pushes read the resolved location into D and
// append it to the stack; constant pushes load the literal with no memory read. Indices 0
// and 1 are folded into the addressing step (`A=M`, `A=M+1`, `D=M+1`, `M=0`, `M=1`) so the
// separate index load disappears. Pops into pointer segments compute the destination
// address into D first and then move the popped value with the add/subtract exchange
// `D=D+M, A=D-M, M=D-A`, which needs neither a scratch cell nor a second read of SP after
// the decrement; the exchange is exact for every 16-bit address under wraparound. Pops
// into the constant segment are rejected.

//! Push/pop code generation.

use crate::core::error::TranslateResult;
use crate::core::register_file::MachineReg;
use crate::core::segment::{Location, Segment};
use crate::core::session::TranslationSession;

use super::encoder::HackEncoder;
use super::instruction::{Comp, Dest};
use super::CommandSite;

fn resolve(site: &CommandSite<'_>, segment: Segment, index: u16) -> TranslateResult<Location> {
    segment
        .resolve(index, site.unit())
        .map_err(|e| site.malformed(e.to_string()))
}

/// `A = RAM[base] + offset`
fn address_indirect(enc: &mut HackEncoder, base: MachineReg, offset: u16) {
    match offset {
        0 => {
            enc.at_reg(base);
            enc.assign(Dest::A, Comp::M);
        }
        1 => {
            enc.at_reg(base);
            enc.assign(Dest::A, Comp::MPlusOne);
        }
        n => {
            enc.at_const(n);
            enc.assign(Dest::D, Comp::A);
            enc.at_reg(base);
            enc.assign(Dest::A, Comp::DPlusM);
        }
    }
}

/// `D = RAM[base] + offset`
fn indirect_into_d(enc: &mut HackEncoder, base: MachineReg, offset: u16) {
    match offset {
        0 => enc.load_d(base),
        1 => {
            enc.at_reg(base);
            enc.assign(Dest::D, Comp::MPlusOne);
        }
        n => {
            enc.at_const(n);
            enc.assign(Dest::D, Comp::A);
            enc.at_reg(base);
            enc.assign(Dest::D, Comp::DPlusM);
        }
    }
}

/// Emit `push segment index`.
pub fn emit_push(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    site: &CommandSite<'_>,
    segment: Segment,
    index: u16,
) -> TranslateResult<()> {
    match resolve(site, segment, index)? {
        Location::Immediate(0) => enc.push_comp(Comp::Zero),
        Location::Immediate(1) => enc.push_comp(Comp::One),
        Location::Immediate(value) => {
            enc.at_const(value);
            enc.assign(Dest::D, Comp::A);
            enc.push_d();
        }
        Location::Indirect { base, offset } => {
            address_indirect(enc, base, offset);
            enc.assign(Dest::D, Comp::M);
            enc.push_d();
        }
        Location::Direct(reg) => {
            enc.load_d(reg);
            enc.push_d();
        }
        Location::Static(_) => {
            let symbol = session.labels.static_cell(site.unit(), index)?;
            enc.at_symbol(symbol);
            enc.assign(Dest::D, Comp::M);
            enc.push_d();
        }
    }
    Ok(())
}

/// Emit `pop segment index`.
pub fn emit_pop(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    site: &CommandSite<'_>,
    segment: Segment,
    index: u16,
) -> TranslateResult<()> {
    match resolve(site, segment, index)? {
        Location::Indirect { base, offset } => {
            // D = addr; SP--; D = addr + v; A = addr; RAM[addr] = v
            indirect_into_d(enc, base, offset);
            enc.at_reg(MachineReg::Sp);
            enc.assign(Dest::AM, Comp::MMinusOne);
            enc.assign(Dest::D, Comp::DPlusM);
            enc.assign(Dest::A, Comp::DMinusM);
            enc.assign(Dest::M, Comp::DMinusA);
        }
        Location::Direct(reg) => {
            enc.pop_to_d();
            enc.store_d(reg);
        }
        Location::Static(_) => {
            let symbol = session.labels.static_cell(site.unit(), index)?;
            enc.pop_to_d();
            enc.at_symbol(symbol);
            enc.assign(Dest::M, Comp::D);
        }
        Location::Immediate(_) => {
            return Err(site.malformed("cannot pop into the constant segment"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Scope, TranslateError};
    use crate::hack::instruction::to_asm;
    use pretty_assertions::assert_eq;

    fn push(segment: Segment, index: u16) -> String {
        let scope = Scope::new("Main", "Main.main");
        let mut session = TranslationSession::new();
        let mut enc = HackEncoder::new();
        emit_push(&mut enc, &mut session, &CommandSite::new(&scope, 0), segment, index).unwrap();
        to_asm(enc.instructions())
    }

    fn pop(segment: Segment, index: u16) -> String {
        let scope = Scope::new("Main", "Main.main");
        let mut session = TranslationSession::new();
        let mut enc = HackEncoder::new();
        emit_pop(&mut enc, &mut session, &CommandSite::new(&scope, 0), segment, index).unwrap();
        to_asm(enc.instructions())
    }

    #[test]
    fn test_push_constant_folds_zero_and_one() {
        assert_eq!(push(Segment::Constant, 0), "@SP\nAM=M+1\nA=A-1\nM=0\n");
        assert_eq!(push(Segment::Constant, 1), "@SP\nAM=M+1\nA=A-1\nM=1\n");
        assert_eq!(push(Segment::Constant, 7), "@7\nD=A\n@SP\nAM=M+1\nA=A-1\nM=D\n");
    }

    #[test]
    fn test_push_pointer_segments() {
        assert_eq!(push(Segment::Local, 0), "@LCL\nA=M\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n");
        assert_eq!(push(Segment::Argument, 1), "@ARG\nA=M+1\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n");
        assert_eq!(
            push(Segment::That, 5),
            "@5\nD=A\n@THAT\nA=D+M\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n"
        );
    }

    #[test]
    fn test_push_fixed_and_static_do_not_dereference() {
        assert_eq!(push(Segment::Temp, 3), "@R8\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n");
        assert_eq!(push(Segment::Pointer, 1), "@THAT\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n");
        assert_eq!(push(Segment::Static, 2), "@Main.2\nD=M\n@SP\nAM=M+1\nA=A-1\nM=D\n");
    }

    #[test]
    fn test_pop_pointer_segments() {
        assert_eq!(pop(Segment::Local, 0), "@LCL\nD=M\n@SP\nAM=M-1\nD=D+M\nA=D-M\nM=D-A\n");
        assert_eq!(pop(Segment::This, 1), "@THIS\nD=M+1\n@SP\nAM=M-1\nD=D+M\nA=D-M\nM=D-A\n");
        assert_eq!(
            pop(Segment::Argument, 9),
            "@9\nD=A\n@ARG\nD=D+M\n@SP\nAM=M-1\nD=D+M\nA=D-M\nM=D-A\n"
        );
    }

    #[test]
    fn test_pop_fixed_and_static() {
        assert_eq!(pop(Segment::Temp, 0), "@SP\nAM=M-1\nD=M\n@R5\nM=D\n");
        assert_eq!(pop(Segment::Pointer, 0), "@SP\nAM=M-1\nD=M\n@THIS\nM=D\n");
        assert_eq!(pop(Segment::Static, 8), "@SP\nAM=M-1\nD=M\n@Main.8\nM=D\n");
    }

    #[test]
    fn test_malformed_operands() {
        let scope = Scope::new("Main", "Main.main");
        let mut session = TranslationSession::new();
        let mut enc = HackEncoder::new();
        let site = CommandSite::new(&scope, 4);

        let err = emit_pop(&mut enc, &mut session, &site, Segment::Constant, 3).unwrap_err();
        assert!(matches!(err, TranslateError::MalformedCommand { position: 4, .. }));

        let err = emit_push(&mut enc, &mut session, &site, Segment::Pointer, 2).unwrap_err();
        assert!(err.to_string().contains("pointer index 2"));

        assert!(emit_pop(&mut enc, &mut session, &site, Segment::Temp, 8).is_err());
        assert!(enc.is_empty());
    }
}
