//! Shortens every local variable name to free up bytes for the packer's
//! 70-char line budget, recording the substitution in a translation table
//! the test driver can use to report failures in the original names.
//!
//! Globals (`:`-prefixed) are left untouched -- they are the channel VMs use
//! to talk to each other, so the name has to stay whatever the other side
//! of the Coordinator expects.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::ast::nolol::Program;
use crate::ast::yolol::{Expression, Statement};
use crate::ast::{walk_nolol_program, NololVisitor, VisitAction, VisitPhase, YololVisitor};
use crate::lexer::KEYWORDS;

use super::VariableTranslationTable;

pub(super) fn rename_variables(program: &mut Program) -> VariableTranslationTable {
    let mut renamer = Renamer::default();
    walk_nolol_program(&mut renamer, program).unwrap_or_else(|e: Infallible| match e {});
    renamer.table
}

#[derive(Default)]
struct Renamer {
    table: HashMap<String, String>,
    next_index: usize,
}

impl Renamer {
    fn shortened(&mut self, name: &str) -> String {
        if is_global(name) {
            return name.to_string();
        }
        if let Some(existing) = self.table.get(name) {
            return existing.clone();
        }
        let short = loop {
            let candidate = short_name(self.next_index);
            self.next_index += 1;
            if !KEYWORDS.contains(&candidate.as_str()) {
                break candidate;
            }
        };
        self.table.insert(name.to_string(), short.clone());
        short
    }
}

fn is_global(name: &str) -> bool {
    name.starts_with(':')
}

/// `0 -> "a"`, `1 -> "b"`, ..., `25 -> "z"`, `26 -> "aa"`, ...
fn short_name(mut index: usize) -> String {
    let mut chars = Vec::new();
    loop {
        let rem = index % 26;
        chars.push((b'a' + rem as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    chars.iter().rev().collect()
}

impl YololVisitor for Renamer {
    type Error = Infallible;

    fn visit_expression(&mut self, node: &mut Expression, phase: VisitPhase) -> Result<VisitAction<Expression>, Self::Error> {
        if phase == VisitPhase::SingleVisit {
            if let Expression::Dereference(d) = node {
                d.variable = self.shortened(&d.variable);
            }
        }
        Ok(VisitAction::Continue)
    }

    fn visit_statement(&mut self, node: &mut Statement, phase: VisitPhase) -> Result<VisitAction<Statement>, Self::Error> {
        match (node, phase) {
            (Statement::Assignment(a), VisitPhase::PreVisit) => a.variable = self.shortened(&a.variable),
            (Statement::Dereference(d), VisitPhase::SingleVisit) => d.variable = self.shortened(&d.variable),
            _ => {}
        }
        Ok(VisitAction::Continue)
    }
}

impl NololVisitor for Renamer {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::nolol::parse_program;

    #[test]
    fn renames_locals_but_not_globals() {
        let mut program = parse_program("longname = 1\n:stays = longname\n").unwrap();
        let table = rename_variables(&mut program);
        assert_eq!(table.get("longname").map(String::as_str), Some("a"));
        assert!(!table.contains_key(":stays"));
    }

    #[test]
    fn reuses_the_same_short_name_for_repeated_uses() {
        let mut program = parse_program("x = 1\nx = x + 1\n").unwrap();
        let table = rename_variables(&mut program);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn skips_short_names_that_collide_with_keywords() {
        // Index 3 alone would be "d", which is fine, but force a run through
        // enough indices to prove the loop steps over any that land on a
        // keyword (none of a..z happen to be keywords, so this mainly
        // documents the guard rather than exercising a real collision).
        let mut program = parse_program("a = 1\nb = 1\n").unwrap();
        let table = rename_variables(&mut program);
        for short in table.values() {
            assert!(!KEYWORDS.contains(&short.as_str()));
        }
    }
}
