// This module is the program assembler: it drives one whole-program translation from
// parsed source units to a single Hack instruction stream. Translator::translate validates
// unit names, then runs a pre-pass that registers every function in the program-wide
// function table so redefinitions are rejected before anything is emitted and calls may
// target functions defined later or in other units. It checks that the entry point exists,
// emits the bootstrap and each shared routine once, and then translates every unit in the
// order given, command by command, dispatching to the per-family generators. Each function
// is closed when the next `function` command or the end of its unit is reached, at which
// point its label references are resolved and its size is recorded. The first error aborts
// the translation and no output is returned.

//! Whole-program translation driver.

use std::collections::HashSet;
use std::io::{self, Write};

use crate::core::error::{TranslateError, TranslateResult};
use crate::core::labels::{validate_symbol, Scope};
use crate::core::register_file::{MAX_IMMEDIATE, STACK_BASE};
use crate::core::session::{SessionStats, TranslationSession};
use crate::hack::arithmetic::emit_arithmetic;
use crate::hack::calling_convention::{
    emit_call, emit_function, emit_return, DEFAULT_INLINE_LOCALS,
};
use crate::hack::control_flow::{emit_goto, emit_if_goto, emit_label, FunctionLabels};
use crate::hack::memory::{emit_pop, emit_push};
use crate::hack::routines::{emit_bootstrap, emit_shared_routines};
use crate::hack::{self, CommandSite, HackEncoder, Instruction};
use crate::vm::{Command, Program, SourceUnit};

/// Translation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// VM function called by the bootstrap.
    pub entry_point: String,
    /// Initial stack pointer.
    pub stack_base: u16,
    /// Largest local count zeroed with inline pushes rather than a loop.
    pub inline_locals_max: u16,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            entry_point: "Sys.init".to_string(),
            stack_base: STACK_BASE,
            inline_locals_max: DEFAULT_INLINE_LOCALS,
        }
    }
}

/// A translated program.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    pub instructions: Vec<Instruction>,
    pub stats: SessionStats,
}

impl TranslationOutput {
    /// Write the program as Hack assembly text.
    pub fn write_asm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        hack::write_asm(out, &self.instructions)
    }

    pub fn to_asm(&self) -> String {
        hack::to_asm(&self.instructions)
    }
}

/// VM-to-Hack translator.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate `program` into one Hack instruction stream.
    pub fn translate(&self, program: &Program) -> TranslateResult<TranslationOutput> {
        self.check_config()?;
        check_unit_names(program)?;

        let mut session = TranslationSession::new();
        register_functions(&mut session, program)?;

        let entry = session
            .function_label(&self.config.entry_point)
            .ok_or_else(|| TranslateError::MissingEntryPoint {
                name: self.config.entry_point.clone(),
            })?;
        log::info!(
            "🚀 Translating {} units ({} commands, {} functions), entry {}",
            program.units.len(),
            program.command_count(),
            session.function_count(),
            entry
        );

        let mut enc = HackEncoder::new();
        emit_bootstrap(&mut enc, self.config.stack_base, &entry);
        emit_shared_routines(&mut enc);
        log::debug!("bootstrap and shared routines: {} instructions", enc.code_size());

        for unit in &program.units {
            self.translate_unit(&mut enc, &mut session, unit)?;
        }

        session.stats_mut().instructions_emitted = enc.code_size();
        let stats = session.into_stats();
        log::info!(
            "✅ Emitted {} instructions ({} call sites, {} comparison sites)",
            stats.instructions_emitted,
            stats.call_sites,
            stats.comparison_sites
        );

        Ok(TranslationOutput {
            instructions: enc.into_instructions(),
            stats,
        })
    }

    fn check_config(&self) -> TranslateResult<()> {
        if self.config.stack_base > MAX_IMMEDIATE {
            return Err(TranslateError::InvalidConfig {
                reason: format!(
                    "stack base {} does not fit an A-instruction (max {MAX_IMMEDIATE})",
                    self.config.stack_base
                ),
            });
        }
        validate_symbol(&self.config.entry_point).map_err(|reason| {
            TranslateError::InvalidConfig {
                reason: format!("entry point: {reason}"),
            }
        })
    }

    fn translate_unit(
        &self,
        enc: &mut HackEncoder,
        session: &mut TranslationSession,
        unit: &SourceUnit,
    ) -> TranslateResult<()> {
        log::info!("📄 Translating unit {} ({} commands)", unit.name, unit.commands.len());

        let mut current: Option<OpenFunction> = None;
        let mut labels = FunctionLabels::new();

        for (position, command) in unit.commands.iter().enumerate() {
            log::trace!("{}#{}: {}", unit.name, position, command);

            if let Command::Function { name, locals } = command {
                if let Some(open) = current.take() {
                    open.close(enc, session, &mut labels)?;
                }
                let open = OpenFunction::new(Scope::new(unit.name.as_str(), name.as_str()), enc);
                let site = CommandSite::new(&open.scope, position);
                emit_function(enc, session, &site, *locals, self.config.inline_locals_max)?;
                current = Some(open);
            } else {
                let open = current.as_ref().ok_or_else(|| {
                    TranslateError::malformed(
                        &unit.name,
                        position,
                        format!("'{command}' appears outside any function"),
                    )
                })?;
                let site = CommandSite::new(&open.scope, position);
                translate_command(enc, session, &mut labels, &site, command)?;
            }

            session.stats_mut().record_command(command.kind());
        }

        if let Some(open) = current.take() {
            open.close(enc, session, &mut labels)?;
        }
        Ok(())
    }
}

/// The function whose body is being emitted.
struct OpenFunction {
    scope: Scope,
    start: usize,
}

impl OpenFunction {
    fn new(scope: Scope, enc: &HackEncoder) -> Self {
        log::debug!("function {} begins at ROM offset {}", scope.entry(), enc.code_size());
        Self {
            scope,
            start: enc.code_size(),
        }
    }

    fn close(
        self,
        enc: &HackEncoder,
        session: &mut TranslationSession,
        labels: &mut FunctionLabels,
    ) -> TranslateResult<()> {
        labels.finish(&self.scope)?;
        let size = enc.code_size() - self.start;
        log::debug!("function {} done: {} instructions", self.scope.entry(), size);
        session.stats_mut().record_function(self.scope.function(), size);
        Ok(())
    }
}

fn translate_command(
    enc: &mut HackEncoder,
    session: &mut TranslationSession,
    labels: &mut FunctionLabels,
    site: &CommandSite<'_>,
    command: &Command,
) -> TranslateResult<()> {
    match command {
        Command::Push { segment, index } => emit_push(enc, session, site, *segment, *index),
        Command::Pop { segment, index } => emit_pop(enc, session, site, *segment, *index),
        Command::Arithmetic(op) => emit_arithmetic(enc, session, site, *op),
        Command::Label(name) => emit_label(enc, labels, session, site, name),
        Command::Goto(name) => emit_goto(enc, labels, session, site, name),
        Command::IfGoto(name) => emit_if_goto(enc, labels, session, site, name),
        Command::Call { function, args } => emit_call(enc, session, site, function, *args),
        Command::Return => {
            emit_return(enc);
            Ok(())
        }
        Command::Function { .. } => Err(site.malformed("nested function declaration")),
    }
}

/// Unit names qualify statics and function labels, so they must be symbols
/// without dots, must not use the reserved `__` prefix, and must be unique.
fn check_unit_names(program: &Program) -> TranslateResult<()> {
    let mut seen = HashSet::new();
    for unit in &program.units {
        let invalid = |reason: String| TranslateError::InvalidUnitName {
            name: unit.name.clone(),
            reason,
        };
        validate_symbol(&unit.name).map_err(invalid)?;
        if unit.name.contains('.') {
            return Err(invalid("unit names may not contain '.'".to_string()));
        }
        if unit.name.starts_with("__") {
            return Err(invalid("the '__' prefix is reserved".to_string()));
        }
        if !seen.insert(unit.name.as_str()) {
            return Err(TranslateError::DuplicateUnit {
                name: unit.name.clone(),
            });
        }
    }
    Ok(())
}

/// Enter every function of the program into the session's function table.
fn register_functions(session: &mut TranslationSession, program: &Program) -> TranslateResult<()> {
    for unit in &program.units {
        for (position, command) in unit.commands.iter().enumerate() {
            if let Command::Function { name, .. } = command {
                validate_symbol(name)
                    .map_err(|reason| TranslateError::malformed(&unit.name, position, reason))?;
                session.define_function(name, &unit.name)?;
            }
        }
    }
    Ok(())
}
