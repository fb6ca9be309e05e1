//! Desugars every NOLOL-only control construct (`while`, multiline `if`,
//! `wait`, symbolic `goto label`) into a flat run of [`StatementLine`]s
//! whose only remaining YOLOL-incompatible feature is a `goto` that targets
//! a label instead of a line number.
//!
//! Those symbolic targets are encoded as negative sentinels in
//! [`crate::ast::yolol::GoToStatement::line`] -- never a legal YOLOL line
//! number, and cheap to carry through the packer -- and resolved for real
//! once [`super::pack::pack`] has decided which physical line each label
//! landed on. See [`resolve_labels`].
//!
//! Elements are rewritten bottom-up: [`crate::ast::NololVisitor::visit_element`]'s
//! `PostVisit` phase only fires after a node's children (and therefore any
//! nested `while`/`if`/`wait` inside its block) have already been lowered,
//! so a loop nested in another loop is already flat by the time its parent
//! is rewritten.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::ast::nolol::{Element, Program, StatementLine};
use crate::ast::yolol::{Expression, GoToStatement, IfStatement, Statement, UnaryOp, UnaryOperation};
use crate::ast::{walk_nolol_program, NololVisitor, Spanned, VisitAction, VisitPhase, YololVisitor};
use crate::lexer::Position;

use super::error::{ConvertError, ConvertErrorKind, ConvertResult};

pub(super) struct LoweredProgram {
    pub lines: Vec<StatementLine>,
    pub pending_gotos: HashMap<i64, String>,
}

pub(super) fn lower(program: &mut Program) -> ConvertResult<LoweredProgram> {
    let mut lowering = Lowering::default();
    walk_nolol_program(&mut lowering, program).unwrap_or_else(|e: Infallible| match e {});

    let mut lines = Vec::with_capacity(program.elements.len());
    for elem in program.elements.drain(..) {
        match elem {
            Element::Statement(s) => lines.push(s),
            other => {
                return Err(ConvertError::new(
                    ConvertErrorKind::NotConstant,
                    "internal: control-flow lowering left a non-statement element behind",
                    other.start(),
                    other.end(),
                ))
            }
        }
    }
    Ok(LoweredProgram {
        lines,
        pending_gotos: lowering.pending_gotos,
    })
}

#[derive(Default)]
struct Lowering {
    pending_gotos: HashMap<i64, String>,
    next_sentinel: i64,
    next_label: usize,
}

impl Lowering {
    fn sentinel_for(&mut self, label: &str) -> i64 {
        self.next_sentinel -= 1;
        self.pending_gotos.insert(self.next_sentinel, label.to_string());
        self.next_sentinel
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("__{prefix}{}", self.next_label);
        self.next_label += 1;
        label
    }

    fn goto_stmt(&mut self, position: &Position, label: &str) -> Statement {
        let line = self.sentinel_for(label);
        Statement::GoTo(GoToStatement {
            position: position.clone(),
            line,
        })
    }

    fn label_marker(&self, position: &Position, label: &str) -> StatementLine {
        StatementLine {
            position: position.clone(),
            statements: Vec::new(),
            has_bol: false,
            has_eol: false,
            label: label.to_string(),
            comment: String::new(),
        }
    }

    fn plain_line(&self, position: &Position, statements: Vec<Statement>) -> StatementLine {
        StatementLine {
            position: position.clone(),
            statements,
            has_bol: false,
            has_eol: false,
            label: String::new(),
            comment: String::new(),
        }
    }
}

fn not(position: &Position, condition: Expression) -> Expression {
    Expression::UnaryOperation(UnaryOperation {
        position: position.clone(),
        op: UnaryOp::Not,
        exp: Box::new(condition),
    })
}

fn guard_if(position: &Position, condition: Expression, then: Vec<Statement>) -> Statement {
    Statement::If(IfStatement {
        position: position.clone(),
        condition,
        then_block: then,
        else_block: None,
    })
}

impl YololVisitor for Lowering {
    type Error = Infallible;
}

impl NololVisitor for Lowering {
    fn visit_element(&mut self, node: &mut Element, phase: VisitPhase) -> Result<VisitAction<Element>, Self::Error> {
        if phase != VisitPhase::PostVisit {
            return Ok(VisitAction::Continue);
        }
        let replacement = match node {
            Element::GoToLabel(g) => {
                let goto = self.goto_stmt(&g.position, &g.label);
                vec![stmt_elem(self.plain_line(&g.position, vec![goto]))]
            }
            Element::While(w) => {
                let start = self.fresh_label("while_start");
                let end = self.fresh_label("while_end");
                let position = w.position.clone();
                let condition = std::mem::replace(
                    &mut w.condition,
                    Expression::NumberConstant(crate::ast::yolol::NumberConstant {
                        position: position.clone(),
                        value: "0".to_string(),
                    }),
                );

                let mut out = Vec::new();
                let exit = self.goto_stmt(&position, &end);
                let mut guard = self.label_marker(&position, &start);
                guard.statements.push(guard_if(&position, not(&position, condition), vec![exit]));
                out.push(stmt_elem(guard));
                out.extend(take_flattened(&mut w.block.elements));
                let back_to_start = self.goto_stmt(&position, &start);
                out.push(stmt_elem(self.plain_line(&position, vec![back_to_start])));
                out.push(stmt_elem(self.label_marker(&position, &end)));
                out
            }
            Element::Wait(w) => {
                let position = w.position.clone();
                let label = self.fresh_label("wait");
                let condition = std::mem::replace(
                    &mut w.condition,
                    Expression::NumberConstant(crate::ast::yolol::NumberConstant {
                        position: position.clone(),
                        value: "0".to_string(),
                    }),
                );
                let loop_back = self.goto_stmt(&position, &label);
                let mut guard = self.label_marker(&position, &label);
                guard.statements.push(guard_if(&position, not(&position, condition), vec![loop_back]));
                vec![stmt_elem(guard)]
            }
            Element::If(ifs) => {
                let position = ifs.position.clone();
                let block_labels: Vec<String> = (0..ifs.conditions.len()).map(|_| self.fresh_label("if_block")).collect();
                let end_label = self.fresh_label("if_end");
                let else_label = if ifs.else_block.is_some() {
                    self.fresh_label("if_else")
                } else {
                    end_label.clone()
                };

                let mut out = Vec::new();
                for (cond, block_label) in ifs.conditions.drain(..).zip(block_labels.iter()) {
                    let jump = self.goto_stmt(&position, block_label);
                    out.push(stmt_elem(self.plain_line(&position, vec![guard_if(&position, cond, vec![jump])])));
                }
                let fallthrough = self.goto_stmt(&position, &else_label);
                out.push(stmt_elem(self.plain_line(&position, vec![fallthrough])));

                for (block, block_label) in ifs.blocks.iter_mut().zip(block_labels.iter()) {
                    out.push(stmt_elem(self.label_marker(&position, block_label)));
                    out.extend(take_flattened(&mut block.elements));
                    let to_end = self.goto_stmt(&position, &end_label);
                    out.push(stmt_elem(self.plain_line(&position, vec![to_end])));
                }

                if let Some(else_block) = &mut ifs.else_block {
                    out.push(stmt_elem(self.label_marker(&position, &else_label)));
                    out.extend(take_flattened(&mut else_block.elements));
                }
                out.push(stmt_elem(self.label_marker(&position, &end_label)));
                out
            }
            Element::Statement(_) | Element::ConstDecl(_) | Element::Include(_) => return Ok(VisitAction::Continue),
        };
        Ok(VisitAction::Replace(replacement))
    }
}

fn stmt_elem(line: StatementLine) -> Element {
    Element::Statement(line)
}

/// Drains a nested block's already-lowered elements (bottom-up traversal
/// guarantees every element left in it is a plain [`Element::Statement`]).
fn take_flattened(elements: &mut Vec<Element>) -> Vec<Element> {
    elements.drain(..).collect()
}

/// Rewrites every sentinel [`GoToStatement::line`] left by [`lower`] into the
/// real, packed line number its label resolved to.
pub(super) fn resolve_labels(
    program: &mut crate::ast::yolol::Program,
    pending: &HashMap<i64, String>,
    positions: &HashMap<String, usize>,
) -> ConvertResult<()> {
    let mut resolver = LabelResolver { pending, positions };
    crate::ast::walk_yolol_program(&mut resolver, program)
}

struct LabelResolver<'a> {
    pending: &'a HashMap<i64, String>,
    positions: &'a HashMap<String, usize>,
}

impl<'a> YololVisitor for LabelResolver<'a> {
    type Error = ConvertError;

    fn visit_statement(&mut self, node: &mut Statement, phase: VisitPhase) -> Result<VisitAction<Statement>, Self::Error> {
        if phase == VisitPhase::SingleVisit {
            if let Statement::GoTo(g) = node {
                if g.line < 0 {
                    let label = self.pending.get(&g.line).ok_or_else(|| {
                        ConvertError::new(
                            ConvertErrorKind::UnresolvedLabel,
                            "internal: goto sentinel has no matching label",
                            g.start(),
                            g.end(),
                        )
                    })?;
                    let target = self.positions.get(label).ok_or_else(|| {
                        ConvertError::new(
                            ConvertErrorKind::UnresolvedLabel,
                            format!("label '{label}' is never defined"),
                            g.start(),
                            g.end(),
                        )
                    })?;
                    g.line = *target as i64;
                }
            }
        }
        Ok(VisitAction::Continue)
    }
}
