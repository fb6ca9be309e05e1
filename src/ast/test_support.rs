//! Test-only helper for checking the round-trip property (P1): `parse(print(ast))
//! == parse(ast)` is only required to hold "up to Position and redundant
//! parentheses", so round-trip tests zero out every position field before
//! comparing two trees structurally.
#![cfg(test)]

use crate::lexer::Position;

use super::nolol;
use super::yolol::{self, Expression, Statement};

pub(crate) fn clear_yolol_positions(program: &mut yolol::Program) {
    for line in &mut program.lines {
        line.position = Position::default();
        for stmt in &mut line.statements {
            clear_statement(stmt);
        }
    }
    // A comment's line number only matters for deciding which printed line
    // it trails; re-lexing the printed source can shift it relative to the
    // original (a comment-only source line doesn't survive printing as its
    // own line), so positions are irrelevant to round-trip equality here.
    for comment in &mut program.comments {
        comment.position = Position::default();
    }
}

fn clear_statement(stmt: &mut Statement) {
    match stmt {
        Statement::Assignment(a) => {
            a.position = Position::default();
            clear_expression(&mut a.expr);
        }
        Statement::If(ifs) => {
            ifs.position = Position::default();
            clear_expression(&mut ifs.condition);
            for s in &mut ifs.then_block {
                clear_statement(s);
            }
            if let Some(else_block) = &mut ifs.else_block {
                for s in else_block {
                    clear_statement(s);
                }
            }
        }
        Statement::GoTo(g) => g.position = Position::default(),
        Statement::Dereference(d) => d.position = Position::default(),
    }
}

fn clear_expression(expr: &mut Expression) {
    match expr {
        Expression::StringConstant(s) => s.position = Position::default(),
        Expression::NumberConstant(n) => n.position = Position::default(),
        Expression::Dereference(d) => d.position = Position::default(),
        Expression::UnaryOperation(u) => {
            u.position = Position::default();
            clear_expression(&mut u.exp);
        }
        Expression::BinaryOperation(b) => {
            clear_expression(&mut b.l);
            clear_expression(&mut b.r);
        }
        Expression::FuncCall(f) => clear_expression(&mut f.arg),
    }
}

pub(crate) fn clear_nolol_positions(program: &mut nolol::Program) {
    for elem in &mut program.elements {
        clear_element(elem);
    }
}

fn clear_block(block: &mut nolol::Block) {
    for elem in &mut block.elements {
        clear_element(elem);
    }
}

fn clear_element(elem: &mut nolol::Element) {
    match elem {
        nolol::Element::Statement(s) => {
            s.position = Position::default();
            for stmt in &mut s.statements {
                clear_statement(stmt);
            }
        }
        nolol::Element::ConstDecl(c) => {
            c.position = Position::default();
            clear_expression(&mut c.value);
        }
        nolol::Element::If(ifs) => {
            ifs.position = Position::default();
            for cond in &mut ifs.conditions {
                clear_expression(cond);
            }
            for block in &mut ifs.blocks {
                clear_block(block);
            }
            if let Some(else_block) = &mut ifs.else_block {
                clear_block(else_block);
            }
        }
        nolol::Element::GoToLabel(g) => g.position = Position::default(),
        nolol::Element::While(w) => {
            w.position = Position::default();
            clear_expression(&mut w.condition);
            clear_block(&mut w.block);
        }
        nolol::Element::Wait(w) => {
            w.position = Position::default();
            clear_expression(&mut w.condition);
        }
        nolol::Element::Include(i) => i.position = Position::default(),
    }
}
