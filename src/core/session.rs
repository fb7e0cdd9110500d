// This module provides the translation session, the single owner of all mutable
// whole-program state. TranslationSession holds the label allocator (return-address
// counter and static-cell table), the program-wide function table that maps every VM
// function name to the unit defining it, and the session statistics. The driver creates
// one session per program and threads it by mutable reference into each generator, so
// nothing is global and two translations never share counters. SessionStats tracks
// functions and commands translated (broken down by command kind), instructions emitted,
// call and comparison sites, and the largest function, for the CLI's --stats report.

//! Translation session management.

use std::collections::HashMap;
use std::fmt;

use super::error::{TranslateError, TranslateResult};
use super::labels::{function_entry, LabelAllocator};

/// Whole-program translation state.
#[derive(Debug, Default)]
pub struct TranslationSession {
    /// Label and static-cell allocation.
    pub labels: LabelAllocator,

    /// Function name -> defining unit.
    functions: HashMap<String, String>,

    /// Session statistics.
    stats: SessionStats,
}

impl TranslationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as defined in `unit`.
    pub fn define_function(&mut self, name: &str, unit: &str) -> TranslateResult<()> {
        if let Some(first) = self.functions.get(name) {
            return Err(TranslateError::FunctionRedefinition {
                name: name.to_string(),
                first_unit: first.clone(),
                second_unit: unit.to_string(),
            });
        }
        self.functions.insert(name.to_string(), unit.to_string());
        Ok(())
    }

    /// Entry label of function `name`, if any unit defines it.
    pub fn function_label(&self, name: &str) -> Option<String> {
        self.functions
            .get(name)
            .map(|unit| function_entry(unit, name))
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SessionStats {
        &mut self.stats
    }

    /// Consume the session, returning its statistics.
    pub fn into_stats(mut self) -> SessionStats {
        self.stats.static_cells = self.labels.statics().len();
        self.stats
    }
}

/// Translation statistics.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Number of functions translated.
    pub functions_translated: usize,

    /// Number of VM commands translated.
    pub commands_translated: usize,

    /// Count of each command kind translated.
    pub command_counts: HashMap<String, usize>,

    /// Instructions emitted, labels excluded.
    pub instructions_emitted: usize,

    /// Call sites emitted.
    pub call_sites: usize,

    /// Comparison sites emitted.
    pub comparison_sites: usize,

    /// Static cells in use.
    pub static_cells: usize,

    /// Size of the largest function, in instructions.
    pub largest_function_size: usize,

    /// Name of largest function.
    pub largest_function_name: String,
}

impl SessionStats {
    /// Record one translated command of the given kind.
    pub fn record_command(&mut self, kind: &str) {
        self.commands_translated += 1;
        *self.command_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Record a finished function of `size` instructions.
    pub fn record_function(&mut self, name: &str, size: usize) {
        self.functions_translated += 1;
        if size > self.largest_function_size {
            self.largest_function_size = size;
            self.largest_function_name = name.to_string();
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Translation Statistics:")?;
        writeln!(f, "  Functions translated: {}", self.functions_translated)?;
        writeln!(f, "  Commands translated: {}", self.commands_translated)?;
        writeln!(f, "  Instructions emitted: {}", self.instructions_emitted)?;
        writeln!(f, "  Call sites: {}", self.call_sites)?;
        writeln!(f, "  Comparison sites: {}", self.comparison_sites)?;
        writeln!(f, "  Static cells: {}", self.static_cells)?;
        if !self.largest_function_name.is_empty() {
            writeln!(
                f,
                "  Largest function: {} ({} instructions)",
                self.largest_function_name, self.largest_function_size
            )?;
        }

        let mut kinds: Vec<_> = self.command_counts.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            writeln!(f, "    {kind}: {count}")?;
        }
        Ok(())
    }
}
