//! Greedily coalesces the flattened, lowered [`StatementLine`]s onto as few
//! physical YOLOL lines as the 20-line/70-char budget allows.
//!
//! A line starts fresh whenever it carries a label (so every `goto` target
//! is guaranteed to sit at the start of its own physical line -- the
//! simplest rule that can never merge a jump target into the middle of
//! someone else's line), a `$`-prefixed begin-of-line marker, or appending
//! it to the line under construction would blow the character budget.
//! `$`-suffixed end-of-line markers close the current line without
//! necessarily starting the next one early.

use std::collections::HashMap;

use crate::ast::nolol::StatementLine;
use crate::ast::yolol::{Line, Program};
use crate::printer::yolol::print_statement_list;

use super::error::{ConvertError, ConvertErrorKind, ConvertResult};

pub(super) const MAX_LINES: usize = 20;
pub(super) const MAX_LINE_WIDTH: usize = 70;

pub(super) struct PackedProgram {
    pub program: Program,
    /// 1-based physical line number each label landed on.
    pub label_positions: HashMap<String, usize>,
}

pub(super) fn pack(statement_lines: &[StatementLine]) -> ConvertResult<PackedProgram> {
    let mut lines: Vec<Line> = Vec::new();
    let mut label_positions = HashMap::new();
    let mut current: Option<Line> = None;
    let mut force_new = true;

    for stmt_line in statement_lines {
        let must_start_new = force_new || stmt_line.has_bol || !stmt_line.label.is_empty();
        if must_start_new {
            if let Some(line) = current.take() {
                push_line(&mut lines, line, stmt_line)?;
            }
            if !stmt_line.label.is_empty() {
                label_positions.insert(stmt_line.label.clone(), lines.len() + 1);
            }
            current = Some(Line {
                position: stmt_line.position.clone(),
                statements: stmt_line.statements.clone(),
            });
        } else {
            let line = current.as_mut().expect("must_start_new is false only once a current line exists");
            let mut candidate = line.statements.clone();
            candidate.extend(stmt_line.statements.iter().cloned());
            if print_statement_list(&candidate).chars().count() > MAX_LINE_WIDTH {
                let closed = current.take().unwrap();
                push_line(&mut lines, closed, stmt_line)?;
                current = Some(Line {
                    position: stmt_line.position.clone(),
                    statements: stmt_line.statements.clone(),
                });
            } else {
                line.statements = candidate;
            }
        }
        force_new = stmt_line.has_eol;
    }

    if let Some(line) = current.take() {
        if lines.len() >= MAX_LINES {
            return Err(too_long(&line));
        }
        lines.push(line);
    }

    Ok(PackedProgram {
        program: Program { lines, comments: Vec::new() },
        label_positions,
    })
}

fn push_line(lines: &mut Vec<Line>, line: Line, next: &StatementLine) -> ConvertResult<()> {
    if lines.len() >= MAX_LINES {
        return Err(ConvertError::new(
            ConvertErrorKind::ProgramTooLong,
            format!("packed program exceeds the {MAX_LINES}-line YOLOL budget"),
            next.position.clone(),
            next.position.clone(),
        ));
    }
    lines.push(line);
    Ok(())
}

fn too_long(line: &Line) -> ConvertError {
    ConvertError::new(
        ConvertErrorKind::ProgramTooLong,
        format!("packed program exceeds the {MAX_LINES}-line YOLOL budget"),
        line.position.clone(),
        line.position.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Position;

    fn line(label: &str, n: i64) -> StatementLine {
        use crate::ast::yolol::{Assignment, AssignOp, Expression, NumberConstant};
        StatementLine {
            position: Position::new(1, 1),
            statements: vec![crate::ast::yolol::Statement::Assignment(Assignment {
                position: Position::new(1, 1),
                variable: "a".to_string(),
                operator: AssignOp::Assign,
                expr: Expression::NumberConstant(NumberConstant {
                    position: Position::new(1, 1),
                    value: n.to_string(),
                }),
            })],
            has_bol: false,
            has_eol: false,
            label: label.to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn merges_unlabeled_lines_onto_one_physical_line() {
        let lines = vec![line("", 1), line("", 2)];
        let packed = pack(&lines).unwrap();
        assert_eq!(packed.program.lines.len(), 1);
        assert_eq!(packed.program.lines[0].statements.len(), 2);
    }

    #[test]
    fn a_labeled_line_always_starts_fresh() {
        let lines = vec![line("", 1), line("target", 2)];
        let packed = pack(&lines).unwrap();
        assert_eq!(packed.program.lines.len(), 2);
        assert_eq!(packed.label_positions.get("target"), Some(&2));
    }

    #[test]
    fn rejects_programs_that_would_need_more_than_twenty_lines() {
        let lines: Vec<_> = (0..21).map(|i| line(&format!("l{i}"), i)).collect();
        let err = pack(&lines).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::ProgramTooLong);
    }
}
