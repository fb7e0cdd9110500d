// This module models the shared subroutines that replace per-site inlining. Each
// SharedRoutine is a statically known, singly-instantiated procedure with a fixed entry
// label and a documented scratch contract: what the caller must place where before jumping
// in, which cells the routine clobbers, and what it guarantees on return. Call sites reach
// a routine with an unconditional jump after loading their own return-address label into
// D, and the routine returns through a scratch cell with an indirect jump. The module also
// emits the bootstrap, which sets SP and calls the entry function through the same shared
// call routine, and emit_shared_routines, which the driver uses to place every routine in
// the output exactly once.

//! Shared subroutines, their calling contracts, and the bootstrap.

use crate::core::register_file::MachineReg;
use crate::vm::ArithmeticOp;

use super::arithmetic::emit_compare_routine;
use super::calling_convention::{emit_call_routine, emit_call_sequence, emit_return_routine};
use super::encoder::HackEncoder;
use super::instruction::{Comp, Dest, Jump};

/// Return label of the bootstrap's call to the entry function.
pub const BOOTSTRAP_RETURN: &str = "__BOOTSTRAP$ret";

/// Halt loop reached if the entry function ever returns.
pub const HALT: &str = "__HALT";

/// The three comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    Eq,
    Gt,
    Lt,
}

impl CompareKind {
    pub const ALL: [CompareKind; 3] = [CompareKind::Eq, CompareKind::Gt, CompareKind::Lt];

    /// Tag used in return-address labels of comparison sites.
    pub const fn tag(self) -> &'static str {
        match self {
            CompareKind::Eq => "eq",
            CompareKind::Gt => "gt",
            CompareKind::Lt => "lt",
        }
    }

    pub const fn from_op(op: ArithmeticOp) -> Option<Self> {
        match op {
            ArithmeticOp::Eq => Some(CompareKind::Eq),
            ArithmeticOp::Gt => Some(CompareKind::Gt),
            ArithmeticOp::Lt => Some(CompareKind::Lt),
            _ => None,
        }
    }

    /// Jump condition on `x - y` that makes `x OP y` true.
    pub const fn true_when(self) -> Jump {
        match self {
            CompareKind::Eq => Jump::Jeq,
            CompareKind::Gt => Jump::Jgt,
            CompareKind::Lt => Jump::Jlt,
        }
    }
}

/// Where a routine expects one of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// The D register at the moment of the jump.
    D,
    /// A scratch cell.
    Cell(MachineReg),
}

/// Scratch-register contract of a shared routine.
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    /// What the caller must load, and where, before jumping to the entry.
    pub inputs: &'static [(Carrier, &'static str)],
    /// Scratch cells the routine overwrites.
    pub clobbers: &'static [MachineReg],
    /// What holds when control reaches the return address.
    pub guarantee: &'static str,
}

const CALL_CONTRACT: Contract = Contract {
    inputs: &[
        (Carrier::Cell(MachineReg::CALL_ARG_COUNT), "number of arguments pushed"),
        (Carrier::Cell(MachineReg::CALL_TARGET), "callee entry address"),
        (Carrier::D, "return address"),
    ],
    clobbers: &[],
    guarantee: "frame pushed; ARG = first argument; LCL = SP; control at the callee",
};

const RETURN_CONTRACT: Contract = Contract {
    inputs: &[],
    clobbers: &[MachineReg::RETURN_ADDRESS, MachineReg::FRAME],
    guarantee: "return value at the caller's stack top; LCL, ARG, THIS, THAT restored",
};

const COMPARE_CONTRACT: Contract = Contract {
    inputs: &[(Carrier::D, "return address")],
    clobbers: &[MachineReg::COMPARE_RETURN],
    guarantee: "two operands replaced by one boolean (-1 or 0)",
};

/// A routine emitted once per program and reached by jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedRoutine {
    Call,
    Return,
    Compare(CompareKind),
}

impl SharedRoutine {
    /// Every shared routine, in emission order.
    pub const ALL: [SharedRoutine; 5] = [
        SharedRoutine::Call,
        SharedRoutine::Return,
        SharedRoutine::Compare(CompareKind::Eq),
        SharedRoutine::Compare(CompareKind::Gt),
        SharedRoutine::Compare(CompareKind::Lt),
    ];

    /// Entry label.
    pub const fn entry(self) -> &'static str {
        match self {
            SharedRoutine::Call => "__CALL",
            SharedRoutine::Return => "__RETURN",
            SharedRoutine::Compare(CompareKind::Eq) => "__EQ",
            SharedRoutine::Compare(CompareKind::Gt) => "__GT",
            SharedRoutine::Compare(CompareKind::Lt) => "__LT",
        }
    }

    /// Routine-private label `name`.
    pub fn internal(self, name: &str) -> String {
        format!("{}${name}", self.entry())
    }

    pub fn contract(self) -> Contract {
        match self {
            SharedRoutine::Call => CALL_CONTRACT,
            SharedRoutine::Return => RETURN_CONTRACT,
            SharedRoutine::Compare(_) => COMPARE_CONTRACT,
        }
    }

    /// Emit the routine body, starting with its entry label.
    pub fn emit(self, enc: &mut HackEncoder) {
        match self {
            SharedRoutine::Call => emit_call_routine(enc),
            SharedRoutine::Return => emit_return_routine(enc),
            SharedRoutine::Compare(kind) => emit_compare_routine(enc, kind),
        }
    }
}

/// Emit the bootstrap: `SP = stack_base`, call the entry function with no
/// arguments, then halt.
pub fn emit_bootstrap(enc: &mut HackEncoder, stack_base: u16, entry_label: &str) {
    enc.at_const(stack_base);
    enc.assign(Dest::D, Comp::A);
    enc.store_d(MachineReg::Sp);

    emit_call_sequence(enc, entry_label, 0, BOOTSTRAP_RETURN);

    enc.label(HALT);
    enc.goto(HALT);
}

/// Emit every shared routine exactly once.
pub fn emit_shared_routines(enc: &mut HackEncoder) {
    for routine in SharedRoutine::ALL {
        routine.emit(enc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hack::instruction::{to_asm, Instruction, Operand};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bootstrap_sets_sp_then_calls_entry() {
        let mut enc = HackEncoder::new();
        emit_bootstrap(&mut enc, 256, "Sys.Sys.init");
        assert_eq!(
            to_asm(enc.instructions()),
            "@256\nD=A\n@SP\nM=D\n\
             @R13\nM=0\n\
             @Sys.Sys.init\nD=A\n@R14\nM=D\n\
             @__BOOTSTRAP$ret\nD=A\n@__CALL\n0;JMP\n\
             (__BOOTSTRAP$ret)\n(__HALT)\n@__HALT\n0;JMP\n"
        );
    }

    #[test]
    fn test_each_routine_emitted_once() {
        let mut enc = HackEncoder::new();
        emit_shared_routines(&mut enc);
        for routine in SharedRoutine::ALL {
            let entries = enc
                .instructions()
                .iter()
                .filter(|inst| **inst == Instruction::Label(routine.entry().to_string()))
                .count();
            assert_eq!(entries, 1, "{} declared {} times", routine.entry(), entries);
        }
    }

    #[test]
    fn test_routines_touch_only_their_declared_scratch_cells() {
        let scratch = [MachineReg::R13, MachineReg::R14, MachineReg::R15];
        for routine in SharedRoutine::ALL {
            let mut enc = HackEncoder::new();
            routine.emit(&mut enc);
            let contract = routine.contract();
            for inst in enc.instructions() {
                if let Instruction::Address(Operand::Register(reg)) = inst {
                    if scratch.contains(reg) {
                        let declared = contract.clobbers.contains(reg)
                            || contract.inputs.iter().any(|(c, _)| *c == Carrier::Cell(*reg));
                        assert!(declared, "{} uses undeclared {}", routine.entry(), reg);
                    }
                }
            }
        }
    }

    #[test]
    fn test_compare_kinds() {
        assert_eq!(CompareKind::from_op(ArithmeticOp::Gt), Some(CompareKind::Gt));
        assert_eq!(CompareKind::from_op(ArithmeticOp::Add), None);
        assert_eq!(SharedRoutine::Compare(CompareKind::Lt).internal("TRUE"), "__LT$TRUE");
    }
}
