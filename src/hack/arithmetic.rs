// This module implements the arithmetic/logic generator. Binary operations (add, sub, and,
// or) pop the right operand into D and combine it in place with the left operand, so the
// stack shrinks by one with a single SP update. Unary operations (neg, not) rewrite the top
// cell without touching SP. Comparisons are not inlined: each site loads a fresh
// return-address label into D and jumps to the shared EQ, GT or LT routine, whose bodies
// are emitted here as well. GT and LT split on operand signs before subtracting, so the
// result is correct even when `x - y` would overflow 16 bits.

//! Arithmetic, logic and comparison code generation.

use crate::core::error::TranslateResult;
use crate::core::register_file::MachineReg;
use crate::core::session::TranslationSession;
use crate::vm::ArithmeticOp;

use super::encoder::HackEncoder;
use super::instruction::{Comp, Dest, Jump};
use super::routines::{CompareKind, SharedRoutine};
use super::CommandSite;

/// Emit one arithmetic/logic command.
pub fn emit_arithmetic(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    site: &CommandSite<'_>,
    op: ArithmeticOp,
) -> TranslateResult<()> {
    match op {
        ArithmeticOp::Add => emit_binary(enc, Comp::DPlusM),
        ArithmeticOp::Sub => emit_binary(enc, Comp::MMinusD),
        ArithmeticOp::And => emit_binary(enc, Comp::DAndM),
        ArithmeticOp::Or => emit_binary(enc, Comp::DOrM),
        ArithmeticOp::Neg => emit_unary(enc, Comp::NegM),
        ArithmeticOp::Not => emit_unary(enc, Comp::NotM),
        ArithmeticOp::Eq => emit_compare_site(enc, session, site, CompareKind::Eq),
        ArithmeticOp::Gt => emit_compare_site(enc, session, site, CompareKind::Gt),
        ArithmeticOp::Lt => emit_compare_site(enc, session, site, CompareKind::Lt),
    }
    Ok(())
}

/// `y = pop; x = top; top = comp(x, y)` with D = y and M = x.
fn emit_binary(enc: &mut HackEncoder, comp: Comp) {
    enc.pop_to_d();
    enc.assign(Dest::A, Comp::AMinusOne);
    enc.assign(Dest::M, comp);
}

fn emit_unary(enc: &mut HackEncoder, comp: Comp) {
    enc.address_top();
    enc.assign(Dest::M, comp);
}

fn emit_compare_site(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    site: &CommandSite<'_>,
    kind: CompareKind,
) {
    let ret = session.labels.next_return(site.scope, kind.tag());
    enc.at_symbol(ret.as_str());
    enc.assign(Dest::D, Comp::A);
    enc.goto(SharedRoutine::Compare(kind).entry());
    enc.label(ret);
    session.stats_mut().comparison_sites += 1;
}

/// Emit the shared routine for `kind`. Expects the return address in D.
pub fn emit_compare_routine(enc: &mut HackEncoder, kind: CompareKind) {
    let routine = SharedRoutine::Compare(kind);
    enc.label(routine.entry());
    enc.store_d(MachineReg::COMPARE_RETURN);

    match kind {
        CompareKind::Eq => {
            let end = routine.internal("END");
            enc.pop_to_d();
            enc.assign(Dest::A, Comp::AMinusOne);
            enc.assign(Dest::D, Comp::MMinusD);
            enc.assign(Dest::M, Comp::Zero);
            enc.branch_on_d(end.as_str(), Jump::Jne);
            enc.address_top();
            enc.assign(Dest::M, Comp::MinusOne);
            enc.label(end);
            enc.goto_indirect(MachineReg::COMPARE_RETURN);
        }
        CompareKind::Gt | CompareKind::Lt => {
            let y_negative = routine.internal("YNEG");
            let subtract = routine.internal("SUB");
            let when_true = routine.internal("TRUE");
            let when_false = routine.internal("FALSE");
            // Outcome when the signs differ: x < 0 <= y means x < y.
            let (x_neg_y_pos, x_pos_y_neg) = match kind {
                CompareKind::Gt => (&when_false, &when_true),
                _ => (&when_true, &when_false),
            };

            // D = y, SP now points at y.
            enc.pop_to_d();
            enc.branch_on_d(y_negative.as_str(), Jump::Jlt);

            // y >= 0
            enc.address_top();
            enc.assign(Dest::D, Comp::M);
            enc.branch_on_d(x_neg_y_pos.as_str(), Jump::Jlt);
            enc.goto(subtract.as_str());

            // y < 0
            enc.label(y_negative);
            enc.address_top();
            enc.assign(Dest::D, Comp::M);
            enc.branch_on_d(x_pos_y_neg.as_str(), Jump::Jge);

            // Same signs: x - y cannot overflow.
            enc.label(subtract);
            enc.at_reg(MachineReg::Sp);
            enc.assign(Dest::A, Comp::M);
            enc.assign(Dest::D, Comp::M);
            enc.assign(Dest::A, Comp::AMinusOne);
            enc.assign(Dest::D, Comp::MMinusD);
            enc.branch_on_d(when_true.as_str(), kind.true_when());

            enc.label(when_false);
            enc.address_top();
            enc.assign(Dest::M, Comp::Zero);
            enc.goto_indirect(MachineReg::COMPARE_RETURN);

            enc.label(when_true);
            enc.address_top();
            enc.assign(Dest::M, Comp::MinusOne);
            enc.goto_indirect(MachineReg::COMPARE_RETURN);
        }
    }
}
