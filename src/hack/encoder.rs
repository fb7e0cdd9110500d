// This module provides the instruction buffer every generator writes into. HackEncoder
// appends abstract Hack instructions in order and offers one method per instruction form
// (address loads of constants, machine registers and symbols; assignments; conditional and
// unconditional jumps; label declarations) plus the handful of stack idioms that recur in
// almost every VM command: pushing D, pushing a constant computation, popping into D and
// addressing the top of the stack. Keeping those idioms in one place means each stack
// access compiles to exactly the same instruction sequence wherever it appears.

//! Hack instruction emission.

use crate::core::register_file::{MachineReg, MAX_IMMEDIATE};

use super::instruction::{code_size, Comp, Dest, Instruction, Jump, Operand};

/// Instruction buffer with helpers for common Hack idioms.
#[derive(Debug, Default, Clone)]
pub struct HackEncoder {
    code: Vec<Instruction>,
}

impl HackEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `@reg`
    pub fn at_reg(&mut self, reg: MachineReg) {
        self.code.push(Instruction::Address(Operand::Register(reg)));
    }

    /// `@value`
    pub fn at_const(&mut self, value: u16) {
        debug_assert!(value <= MAX_IMMEDIATE, "immediate {value} does not fit an A-instruction");
        self.code.push(Instruction::Address(Operand::Constant(value)));
    }

    /// `@symbol`
    pub fn at_symbol(&mut self, symbol: impl Into<String>) {
        self.code.push(Instruction::Address(Operand::Symbol(symbol.into())));
    }

    /// `dest=comp`
    pub fn assign(&mut self, dest: Dest, comp: Comp) {
        self.code.push(Instruction::Compute { dest, comp, jump: Jump::None });
    }

    /// `comp;jump`
    pub fn jump(&mut self, comp: Comp, jump: Jump) {
        self.code.push(Instruction::Compute { dest: Dest::None, comp, jump });
    }

    /// `@symbol`, `0;JMP`
    pub fn goto(&mut self, symbol: impl Into<String>) {
        self.at_symbol(symbol);
        self.jump(Comp::Zero, Jump::Jmp);
    }

    /// `@symbol`, `D;jump`
    pub fn branch_on_d(&mut self, symbol: impl Into<String>, jump: Jump) {
        self.at_symbol(symbol);
        self.jump(Comp::D, jump);
    }

    /// Jump to the address stored in `reg`.
    pub fn goto_indirect(&mut self, reg: MachineReg) {
        self.at_reg(reg);
        self.assign(Dest::A, Comp::M);
        self.jump(Comp::Zero, Jump::Jmp);
    }

    /// `(symbol)`
    pub fn label(&mut self, symbol: impl Into<String>) {
        self.code.push(Instruction::Label(symbol.into()));
    }

    /// `*SP = comp; SP++` where `comp` may only read A (the new top address).
    pub fn push_comp(&mut self, comp: Comp) {
        self.at_reg(MachineReg::Sp);
        self.assign(Dest::AM, Comp::MPlusOne);
        self.assign(Dest::A, Comp::AMinusOne);
        self.assign(Dest::M, comp);
    }

    /// `*SP = D; SP++`
    pub fn push_d(&mut self) {
        self.push_comp(Comp::D);
    }

    /// `SP--; D = *SP`, leaving A at the popped cell.
    pub fn pop_to_d(&mut self) {
        self.at_reg(MachineReg::Sp);
        self.assign(Dest::AM, Comp::MMinusOne);
        self.assign(Dest::D, Comp::M);
    }

    /// `A = SP - 1`, so `M` is the top of the stack.
    pub fn address_top(&mut self) {
        self.at_reg(MachineReg::Sp);
        self.assign(Dest::A, Comp::MMinusOne);
    }

    /// `reg = D`
    pub fn store_d(&mut self, reg: MachineReg) {
        self.at_reg(reg);
        self.assign(Dest::M, Comp::D);
    }

    /// `D = reg`
    pub fn load_d(&mut self, reg: MachineReg) {
        self.at_reg(reg);
        self.assign(Dest::D, Comp::M);
    }

    /// Append already-built instructions.
    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.code.extend(instructions);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    /// ROM words emitted so far (labels excluded).
    pub fn code_size(&self) -> usize {
        code_size(&self.code)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }
}
