// This module implements the VM calling convention on the Hack platform. A call frame is
// five cells pushed above the caller's arguments: return address, then the caller's LCL,
// ARG, THIS and THAT, in that order. On entry to the callee ARG points at the first
// argument (`SP - nArgs - 5` after the frame is pushed) and LCL equals SP; `function`
// then zeroes the callee's locals. Both directions go through shared routines. A call
// site loads the argument count into R13, the callee entry into R14 and its own return
// label into D, then jumps to the call routine. A return site jumps to the return routine,
// which saves the return address before the return value can overwrite it (the two share a
// cell when nArgs is zero), copies the return value to the caller's stack top, restores
// the four bases in reverse order through a walking frame pointer, and jumps back.
// FrameLayout describes the frame offsets both routines agree on. Small local counts are
// zeroed inline; larger ones use a counted loop, which is shorter once it amortises its
// fixed cost.

//! Call/return protocol and function prologues.

use crate::core::error::{TranslateError, TranslateResult};
use crate::core::labels::Scope;
use crate::core::register_file::{MachineReg, MAX_IMMEDIATE};
use crate::core::session::TranslationSession;

use super::encoder::HackEncoder;
use super::instruction::{Comp, Dest, Jump};
use super::routines::SharedRoutine;
use super::CommandSite;

/// Cells pushed by a call: return address plus four saved bases.
pub const FRAME_SIZE: u16 = 5;

/// Number of locals zeroed inline before switching to a loop.
pub const DEFAULT_INLINE_LOCALS: u16 = 2;

/// A cell of the saved call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSlot {
    ReturnAddress,
    Saved(MachineReg),
}

/// Layout of the saved frame, lowest address first.
pub struct FrameLayout;

impl FrameLayout {
    /// Push order of the frame.
    pub const SLOTS: [FrameSlot; FRAME_SIZE as usize] = [
        FrameSlot::ReturnAddress,
        FrameSlot::Saved(MachineReg::SAVED_BASES[0]),
        FrameSlot::Saved(MachineReg::SAVED_BASES[1]),
        FrameSlot::Saved(MachineReg::SAVED_BASES[2]),
        FrameSlot::Saved(MachineReg::SAVED_BASES[3]),
    ];

    /// Distance of `slot` below the callee's LCL.
    pub fn depth(slot: FrameSlot) -> u16 {
        let index = Self::SLOTS
            .iter()
            .position(|s| *s == slot)
            .unwrap_or_default();
        FRAME_SIZE - index as u16
    }
}

/// Emit the call-site sequence: argument count, callee entry and return label
/// handed to the call routine, followed by the return label itself.
pub fn emit_call_sequence(enc: &mut HackEncoder, target: &str, args: u16, return_label: &str) {
    match args {
        0 => {
            enc.at_reg(MachineReg::CALL_ARG_COUNT);
            enc.assign(Dest::M, Comp::Zero);
        }
        1 => {
            enc.at_reg(MachineReg::CALL_ARG_COUNT);
            enc.assign(Dest::M, Comp::One);
        }
        n => {
            enc.at_const(n);
            enc.assign(Dest::D, Comp::A);
            enc.store_d(MachineReg::CALL_ARG_COUNT);
        }
    }

    enc.at_symbol(target);
    enc.assign(Dest::D, Comp::A);
    enc.store_d(MachineReg::CALL_TARGET);

    enc.at_symbol(return_label);
    enc.assign(Dest::D, Comp::A);
    enc.goto(SharedRoutine::Call.entry());
    enc.label(return_label);
}

/// Emit `call function args`.
pub fn emit_call(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    site: &CommandSite<'_>,
    function: &str,
    args: u16,
) -> TranslateResult<()> {
    if args > MAX_IMMEDIATE {
        return Err(site.malformed(format!(
            "argument count {args} is out of range 0..={MAX_IMMEDIATE}"
        )));
    }
    let target = session
        .function_label(function)
        .ok_or_else(|| TranslateError::UndefinedFunction {
            unit: site.unit().to_string(),
            function: site.scope.function().to_string(),
            callee: function.to_string(),
        })?;

    let return_label = session.labels.next_return(site.scope, "ret");
    log::trace!("call {} ({} args) returns to {}", target, args, return_label);

    emit_call_sequence(enc, &target, args, &return_label);
    session.stats_mut().call_sites += 1;
    Ok(())
}

/// Emit `return`.
pub fn emit_return(enc: &mut HackEncoder) {
    enc.goto(SharedRoutine::Return.entry());
}

/// Emit `function name locals`: the entry label, then `locals` zero pushes.
pub fn emit_function(
    enc: &mut HackEncoder,
    session: &TranslationSession,
    site: &CommandSite<'_>,
    locals: u16,
    inline_max: u16,
) -> TranslateResult<()> {
    if locals > MAX_IMMEDIATE {
        return Err(site.malformed(format!(
            "local count {locals} is out of range 0..={MAX_IMMEDIATE}"
        )));
    }
    let scope: &Scope = site.scope;
    enc.label(scope.entry());

    if locals <= inline_max {
        for _ in 0..locals {
            enc.push_comp(Comp::Zero);
        }
        return Ok(());
    }

    let head = session.labels.locals_loop(scope);
    enc.at_const(locals);
    enc.assign(Dest::D, Comp::A);
    enc.label(head.as_str());
    enc.assign(Dest::D, Comp::DMinusOne);
    enc.push_comp(Comp::Zero);
    enc.branch_on_d(head, Jump::Jgt);
    Ok(())
}

/// Emit the shared call routine.
///
/// Pushes D (the return address) and the four bases, points LCL at the new
/// stack top and ARG at `SP - 5 - R13`, then jumps to the address in R14.
pub fn emit_call_routine(enc: &mut HackEncoder) {
    enc.label(SharedRoutine::Call.entry());

    // *SP = return address
    enc.at_reg(MachineReg::Sp);
    enc.assign(Dest::A, Comp::M);
    enc.assign(Dest::M, Comp::D);

    for base in MachineReg::SAVED_BASES {
        enc.load_d(base);
        enc.at_reg(MachineReg::Sp);
        enc.assign(Dest::AM, Comp::MPlusOne);
        enc.assign(Dest::M, Comp::D);
    }

    // SP and LCL now sit just above the frame.
    enc.at_reg(MachineReg::Sp);
    enc.assign(Dest::MD, Comp::MPlusOne);
    enc.store_d(MachineReg::Lcl);

    enc.at_const(FRAME_SIZE);
    enc.assign(Dest::D, Comp::DMinusA);
    enc.at_reg(MachineReg::CALL_ARG_COUNT);
    enc.assign(Dest::D, Comp::DMinusM);
    enc.store_d(MachineReg::Arg);

    enc.goto_indirect(MachineReg::CALL_TARGET);
}

/// Emit the shared return routine.
pub fn emit_return_routine(enc: &mut HackEncoder) {
    enc.label(SharedRoutine::Return.entry());

    // R13 = *(LCL - 5), before the return value can overwrite it.
    enc.at_const(FrameLayout::depth(FrameSlot::ReturnAddress));
    enc.assign(Dest::D, Comp::A);
    enc.at_reg(MachineReg::Lcl);
    enc.assign(Dest::A, Comp::MMinusD);
    enc.assign(Dest::D, Comp::M);
    enc.store_d(MachineReg::RETURN_ADDRESS);

    // *ARG = pop; SP = ARG + 1
    enc.pop_to_d();
    enc.at_reg(MachineReg::Arg);
    enc.assign(Dest::A, Comp::M);
    enc.assign(Dest::M, Comp::D);
    enc.assign(Dest::D, Comp::A);
    enc.at_reg(MachineReg::Sp);
    enc.assign(Dest::M, Comp::DPlusOne);

    // Walk the frame downwards from LCL - 1, restoring THAT, THIS, ARG, LCL.
    enc.load_d(MachineReg::Lcl);
    enc.at_reg(MachineReg::FRAME);
    enc.assign(Dest::AM, Comp::DMinusOne);
    for (i, base) in MachineReg::SAVED_BASES.iter().rev().enumerate() {
        if i > 0 {
            enc.at_reg(MachineReg::FRAME);
            enc.assign(Dest::AM, Comp::MMinusOne);
        }
        enc.assign(Dest::D, Comp::M);
        enc.store_d(*base);
    }

    enc.goto_indirect(MachineReg::RETURN_ADDRESS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hack::instruction::to_asm;
    use pretty_assertions::assert_eq;

    fn session_with(functions: &[(&str, &str)]) -> TranslationSession {
        let mut session = TranslationSession::new();
        for (name, unit) in functions {
            session.define_function(name, unit).unwrap();
        }
        session
    }

    #[test]
    fn test_frame_layout() {
        assert_eq!(FrameLayout::depth(FrameSlot::ReturnAddress), 5);
        assert_eq!(FrameLayout::depth(FrameSlot::Saved(MachineReg::Lcl)), 4);
        assert_eq!(FrameLayout::depth(FrameSlot::Saved(MachineReg::That)), 1);
    }

    #[test]
    fn test_call_site_folds_small_arg_counts() {
        let scope = Scope::new("Main", "Main.main");
        let mut session = session_with(&[("Math.max", "Math")]);
        let mut enc = HackEncoder::new();
        let site = CommandSite::new(&scope, 3);

        emit_call(&mut enc, &mut session, &site, "Math.max", 1).unwrap();
        emit_call(&mut enc, &mut session, &site, "Math.max", 2).unwrap();

        assert_eq!(
            to_asm(enc.instructions()),
            "@R13\nM=1\n@Math.Math.max\nD=A\n@R14\nM=D\n\
             @Main.Main.main$ret$1\nD=A\n@__CALL\n0;JMP\n(Main.Main.main$ret$1)\n\
             @2\nD=A\n@R13\nM=D\n@Math.Math.max\nD=A\n@R14\nM=D\n\
             @Main.Main.main$ret$2\nD=A\n@__CALL\n0;JMP\n(Main.Main.main$ret$2)\n"
        );
        assert_eq!(session.stats().call_sites, 2);
    }

    #[test]
    fn test_call_to_undefined_function() {
        let scope = Scope::new("Main", "Main.main");
        let mut session = session_with(&[]);
        let mut enc = HackEncoder::new();
        let err = emit_call(&mut enc, &mut session, &CommandSite::new(&scope, 0), "Nope.f", 0)
            .unwrap_err();
        assert!(matches!(err, TranslateError::UndefinedFunction { ref callee, .. } if callee == "Nope.f"));
        assert!(enc.is_empty());
    }

    #[test]
    fn test_function_prologue_inline_and_loop() {
        let scope = Scope::new("Main", "Main.f");
        let session = TranslationSession::new();
        let site = CommandSite::new(&scope, 0);

        let mut enc = HackEncoder::new();
        emit_function(&mut enc, &session, &site, 2, DEFAULT_INLINE_LOCALS).unwrap();
        assert_eq!(
            to_asm(enc.instructions()),
            "(Main.Main.f)\n@SP\nAM=M+1\nA=A-1\nM=0\n@SP\nAM=M+1\nA=A-1\nM=0\n"
        );

        let mut enc = HackEncoder::new();
        emit_function(&mut enc, &session, &site, 3, DEFAULT_INLINE_LOCALS).unwrap();
        assert_eq!(
            to_asm(enc.instructions()),
            "(Main.Main.f)\n@3\nD=A\n(Main.Main.f$locals$loop)\nD=D-1\n\
             @SP\nAM=M+1\nA=A-1\nM=0\n@Main.Main.f$locals$loop\nD;JGT\n"
        );

        let mut enc = HackEncoder::new();
        emit_function(&mut enc, &session, &site, 0, DEFAULT_INLINE_LOCALS).unwrap();
        assert_eq!(to_asm(enc.instructions()), "(Main.Main.f)\n");
    }

    #[test]
    fn test_call_routine() {
        let mut enc = HackEncoder::new();
        emit_call_routine(&mut enc);
        assert_eq!(
            to_asm(enc.instructions()),
            "(__CALL)\n@SP\nA=M\nM=D\n\
             @LCL\nD=M\n@SP\nAM=M+1\nM=D\n\
             @ARG\nD=M\n@SP\nAM=M+1\nM=D\n\
             @THIS\nD=M\n@SP\nAM=M+1\nM=D\n\
             @THAT\nD=M\n@SP\nAM=M+1\nM=D\n\
             @SP\nMD=M+1\n@LCL\nM=D\n\
             @5\nD=D-A\n@R13\nD=D-M\n@ARG\nM=D\n\
             @R14\nA=M\n0;JMP\n"
        );
    }

    #[test]
    fn test_return_routine() {
        let mut enc = HackEncoder::new();
        emit_return_routine(&mut enc);
        assert_eq!(
            to_asm(enc.instructions()),
            "(__RETURN)\n@5\nD=A\n@LCL\nA=M-D\nD=M\n@R13\nM=D\n\
             @SP\nAM=M-1\nD=M\n@ARG\nA=M\nM=D\nD=A\n@SP\nM=D+1\n\
             @LCL\nD=M\n@R14\nAM=D-1\nD=M\n@THAT\nM=D\n\
             @R14\nAM=M-1\nD=M\n@THIS\nM=D\n\
             @R14\nAM=M-1\nD=M\n@ARG\nM=D\n\
             @R14\nAM=M-1\nD=M\n@LCL\nM=D\n\
             @R13\nA=M\n0;JMP\n"
        );
    }
}
