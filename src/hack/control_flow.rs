// This module implements the control-flow generator: `label`, `goto` and `if-goto`. Every
// label name is re-qualified with the enclosing function's entry label, so two functions
// may reuse the same name without colliding. FunctionLabels tracks, for the function being
// translated, which labels were declared and which were referenced; references may precede
// declarations, so resolution is checked once the function ends. A reference that is never
// declared in the same function, including one that names a label of another function, is
// rejected rather than emitted. `if-goto` branches on any non-zero popped value.

//! Label, goto and if-goto code generation.

use std::collections::HashSet;

use crate::core::error::{TranslateError, TranslateResult};
use crate::core::labels::{validate_symbol, Scope};
use crate::core::session::TranslationSession;

use super::encoder::HackEncoder;
use super::instruction::Jump;
use super::CommandSite;

/// Labels declared and referenced by the function being translated.
#[derive(Debug, Default)]
pub struct FunctionLabels {
    declared: HashSet<String>,
    /// References in source order, for deterministic error reporting.
    referenced: Vec<String>,
}

impl FunctionLabels {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(&mut self, site: &CommandSite<'_>, name: &str) -> TranslateResult<()> {
        if !self.declared.insert(name.to_string()) {
            return Err(TranslateError::DuplicateLabel {
                unit: site.unit().to_string(),
                function: site.scope.function().to_string(),
                label: name.to_string(),
            });
        }
        Ok(())
    }

    fn reference(&mut self, name: &str) {
        self.referenced.push(name.to_string());
    }

    /// Check that every referenced label was declared, then reset for the next function.
    pub fn finish(&mut self, scope: &Scope) -> TranslateResult<()> {
        let unresolved = self
            .referenced
            .iter()
            .find(|name| !self.declared.contains(*name))
            .cloned();
        self.declared.clear();
        self.referenced.clear();

        match unresolved {
            Some(label) => Err(TranslateError::UnresolvedLabel {
                unit: scope.unit().to_string(),
                function: scope.function().to_string(),
                label,
            }),
            None => Ok(()),
        }
    }

    pub fn declared_count(&self) -> usize {
        self.declared.len()
    }
}

fn checked_target(
    session: &TranslationSession,
    site: &CommandSite<'_>,
    name: &str,
) -> TranslateResult<String> {
    validate_symbol(name).map_err(|reason| site.malformed(reason))?;
    Ok(session.labels.local(site.scope, name))
}

/// Emit `label name`.
pub fn emit_label(
    enc: &mut HackEncoder,
    labels: &mut FunctionLabels,
    session: &TranslationSession,
    site: &CommandSite<'_>,
    name: &str,
) -> TranslateResult<()> {
    let target = checked_target(session, site, name)?;
    labels.declare(site, name)?;
    enc.label(target);
    Ok(())
}

/// Emit `goto name`.
pub fn emit_goto(
    enc: &mut HackEncoder,
    labels: &mut FunctionLabels,
    session: &TranslationSession,
    site: &CommandSite<'_>,
    name: &str,
) -> TranslateResult<()> {
    let target = checked_target(session, site, name)?;
    labels.reference(name);
    enc.goto(target);
    Ok(())
}

/// Emit `if-goto name`: pop, jump when the value is not false.
pub fn emit_if_goto(
    enc: &mut HackEncoder,
    labels: &mut FunctionLabels,
    session: &TranslationSession,
    site: &CommandSite<'_>,
    name: &str,
) -> TranslateResult<()> {
    let target = checked_target(session, site, name)?;
    labels.reference(name);
    enc.pop_to_d();
    enc.branch_on_d(target, Jump::Jne);
    Ok(())
}
