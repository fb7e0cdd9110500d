//! Shared test support: a Hack computer that executes translated programs.
//!
//! Instructions are executed directly from the translator's output. Labels
//! resolve to ROM addresses, the predefined symbols to their RAM cells, and
//! any other symbol becomes a variable allocated from RAM 16 upwards in order
//! of first appearance, the way the Hack assembler does it.

#![allow(dead_code)]

use std::collections::HashMap;

use vmtrans::core::register_file::STATIC_BASE;
use vmtrans::hack::{Comp, Dest, Instruction, Jump, Operand};
use vmtrans::{parse_program, TranslationOutput, Translator, TranslatorConfig};

pub const RAM_SIZE: usize = 0x6001;
pub const ROM_SIZE: usize = 0x8000;

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy)]
enum Word {
    A(u16),
    C { dest: Dest, comp: Comp, jump: Jump },
}

pub struct HackComputer {
    rom: Vec<Word>,
    labels: HashMap<String, u16>,
    variables: HashMap<String, u16>,
    ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: u16,
    steps: u64,
}

fn predefined(symbol: &str) -> Option<u16> {
    let address = match symbol {
        "SP" => 0,
        "LCL" => 1,
        "ARG" => 2,
        "THIS" => 3,
        "THAT" => 4,
        "SCREEN" => 0x4000,
        "KBD" => 0x6000,
        _ => {
            let n = symbol.strip_prefix('R')?.parse::<u16>().ok()?;
            return (n < 16).then_some(n);
        }
    };
    Some(address)
}

impl HackComputer {
    pub fn load(program: &[Instruction]) -> Self {
        let mut labels = HashMap::new();
        let mut address = 0u16;
        for inst in program {
            match inst {
                Instruction::Label(name) => {
                    assert!(labels.insert(name.clone(), address).is_none(), "label ({name}) declared twice");
                }
                _ => address += 1,
            }
        }
        assert!((address as usize) <= ROM_SIZE, "program does not fit in ROM");

        let mut variables = HashMap::new();
        let mut next_variable = STATIC_BASE;
        let mut rom = Vec::with_capacity(address as usize);
        for inst in program {
            match inst {
                Instruction::Label(_) => {}
                Instruction::Address(Operand::Constant(value)) => {
                    assert!(*value <= 0x7FFF, "@{value} is not a valid A-instruction");
                    rom.push(Word::A(*value));
                }
                Instruction::Address(Operand::Register(reg)) => rom.push(Word::A(reg.address())),
                Instruction::Address(Operand::Symbol(symbol)) => {
                    let value = match predefined(symbol).or_else(|| labels.get(symbol).copied()) {
                        Some(value) => value,
                        None => *variables.entry(symbol.clone()).or_insert_with(|| {
                            next_variable += 1;
                            next_variable - 1
                        }),
                    };
                    rom.push(Word::A(value));
                }
                Instruction::Compute { dest, comp, jump } => rom.push(Word::C {
                    dest: *dest,
                    comp: *comp,
                    jump: *jump,
                }),
            }
        }

        Self {
            rom,
            labels,
            variables,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
            steps: 0,
        }
    }

    fn compute(&self, comp: Comp) -> i16 {
        let (a, d) = (self.a, self.d);
        let m = || self.ram[a as u16 as usize];
        match comp {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::MinusOne => -1,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m(),
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m(),
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m().wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m().wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m().wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m()),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m()),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m().wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m(),
            Comp::DOrA => d | a,
            Comp::DOrM => d | m(),
        }
    }

    /// Execute one instruction.
    pub fn step(&mut self) {
        let word = self.rom[self.pc as usize];
        self.steps += 1;
        match word {
            Word::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Word::C { dest, comp, jump } => {
                let value = self.compute(comp);
                let target = self.a as u16;
                if dest.writes_m() {
                    self.ram[target as usize] = value;
                }
                if dest.writes_a() {
                    self.a = value;
                }
                if dest.writes_d() {
                    self.d = value;
                }
                self.pc = if jump.taken(value) { target } else { self.pc + 1 };
            }
        }
    }

    /// Run until the program counter reaches `label`.
    pub fn run_until(&mut self, label: &str, max_steps: u64) -> u64 {
        let stop = self.label(label);
        let start = self.steps;
        while self.pc != stop {
            assert!(
                self.steps - start < max_steps,
                "did not reach ({label}) within {max_steps} steps"
            );
            self.step();
        }
        self.steps - start
    }

    pub fn label(&self, name: &str) -> u16 {
        *self
            .labels
            .get(name)
            .unwrap_or_else(|| panic!("no label ({name})"))
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn variable(&self, name: &str) -> Option<u16> {
        self.variables.get(name).copied()
    }

    pub fn ram(&self, address: usize) -> i16 {
        self.ram[address]
    }

    pub fn set_ram(&mut self, address: usize, value: i16) {
        self.ram[address] = value;
    }

    /// Fill `range` with `value`, to catch reads of uninitialised cells.
    pub fn fill(&mut self, range: std::ops::Range<usize>, value: i16) {
        self.ram[range].iter_mut().for_each(|cell| *cell = value);
    }

    /// The `len` cells below the stack pointer, bottom first.
    pub fn stack_top(&self, len: usize) -> Vec<i16> {
        let sp = self.ram[SP] as usize;
        self.ram[sp - len..sp].to_vec()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

pub fn translate(sources: &[(&str, &str)]) -> TranslationOutput {
    translate_with(sources, TranslatorConfig::default())
}

pub fn translate_with(sources: &[(&str, &str)], config: TranslatorConfig) -> TranslationOutput {
    let program = parse_program(sources.iter().copied()).expect("test program parses");
    Translator::new(config)
        .translate(&program)
        .expect("test program translates")
}

/// Translate `sources` and run until `label` is reached.
pub fn run_to(sources: &[(&str, &str)], label: &str) -> HackComputer {
    let output = translate(sources);
    let mut computer = HackComputer::load(&output.instructions);
    computer.run_until(label, 1_000_000);
    computer
}

/// Run a `Sys.init` whose body is `body` followed by a halt loop, and stop
/// when the loop is reached.
pub fn run_body(body: &str) -> HackComputer {
    let text = format!("function Sys.init 0\n{body}\nlabel END\ngoto END\n");
    run_to(&[("Sys", text.as_str())], "Sys.Sys.init$END")
}

/// VM commands leaving `value` on the stack.
pub fn push_value(value: i16) -> String {
    match value {
        i16::MIN => "push constant 32767\nneg\npush constant 1\nsub\n".to_string(),
        v if v < 0 => format!("push constant {}\nneg\n", -(v as i32)),
        v => format!("push constant {v}\n"),
    }
}
