// This module owns symbolic naming for the whole translation. LabelAllocator hands out the
// three disjoint kinds of label the generators need: global function entry points qualified
// by unit and function name, intra-function jump targets re-qualified with their enclosing
// function, and synthetic return-address labels drawn from one program-wide counter so
// that no two call sites (or comparison sites) ever share a label. User-visible names are
// validated to exclude `$`, which makes every synthesized label (two `$` separators)
// structurally distinct from every user label (one `$`). The allocator also keeps the
// static-cell table, which records each (unit, index) static variable once and enforces the
// platform's budget of 240 static cells.

//! Label and static-cell allocation.

use std::collections::HashMap;

use super::error::{TranslateError, TranslateResult};
use super::register_file::STATIC_LIMIT;
use super::segment::static_symbol;

/// The function currently being translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    unit: String,
    function: String,
}

impl Scope {
    pub fn new(unit: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            function: function.into(),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Entry label of the scope's function.
    pub fn entry(&self) -> String {
        function_entry(&self.unit, &self.function)
    }
}

/// Entry label of `function` defined in `unit`.
pub fn function_entry(unit: &str, function: &str) -> String {
    format!("{unit}.{function}")
}

/// Check that `name` is usable as a unit, function or label name.
///
/// Names are assembler symbols: non-empty, not starting with a digit, and made
/// of `[A-Za-z0-9_.:]`. `$` is reserved for synthesized labels.
pub fn validate_symbol(name: &str) -> Result<(), String> {
    let first = match name.chars().next() {
        Some(c) => c,
        None => return Err("name is empty".to_string()),
    };
    if first.is_ascii_digit() {
        return Err(format!("name '{name}' starts with a digit"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':')))
    {
        return Err(format!("name '{name}' contains illegal character '{bad}'"));
    }
    Ok(())
}

/// Program-wide label allocator.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    /// Next return-address index. Shared by call and comparison sites.
    next_return: usize,
    statics: StaticTable,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump target `label` declared inside the scope's function.
    pub fn local(&self, scope: &Scope, label: &str) -> String {
        format!("{}${label}", scope.entry())
    }

    /// Loop head used to zero-initialise the scope's locals.
    pub fn locals_loop(&self, scope: &Scope) -> String {
        format!("{}$locals$loop", scope.entry())
    }

    /// Fresh return-address label for one call site (`tag` = `ret`) or one
    /// comparison site (`tag` = `eq`, `gt` or `lt`).
    pub fn next_return(&mut self, scope: &Scope, tag: &str) -> String {
        self.next_return += 1;
        format!("{}${tag}${}", scope.entry(), self.next_return)
    }

    /// Number of return-address labels issued so far.
    pub fn returns_issued(&self) -> usize {
        self.next_return
    }

    /// Symbol of `static index` in `unit`, registering it on first use.
    pub fn static_cell(&mut self, unit: &str, index: u16) -> TranslateResult<String> {
        self.statics.intern(unit, index)
    }

    pub fn statics(&self) -> &StaticTable {
        &self.statics
    }
}

/// Every static cell the program uses.
#[derive(Debug, Default)]
pub struct StaticTable {
    cells: HashMap<(String, u16), String>,
}

impl StaticTable {
    fn intern(&mut self, unit: &str, index: u16) -> TranslateResult<String> {
        if let Some(symbol) = self.cells.get(&(unit.to_string(), index)) {
            return Ok(symbol.clone());
        }
        if self.cells.len() >= STATIC_LIMIT {
            return Err(TranslateError::StaticOverflow {
                unit: unit.to_string(),
                index,
                limit: STATIC_LIMIT,
            });
        }
        let symbol = static_symbol(unit, index);
        self.cells.insert((unit.to_string(), index), symbol.clone());
        Ok(symbol)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
