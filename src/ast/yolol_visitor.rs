use super::visitor::{splice_list, VisitAction, VisitPhase};
use super::yolol::{BinaryOperation, Expression, IfStatement, Line, Program, Statement};

/// A pass over the YOLOL AST. Every method has a no-op default, so a
/// concrete visitor only overrides the node kinds it cares about (the
/// printer overrides nearly all of them; the constant folder used by the
/// NOLOL converter only overrides `visit_expression`).
pub trait YololVisitor {
    type Error;

    fn visit_program(&mut self, _node: &mut Program, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_line(&mut self, _node: &mut Line, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_statement(
        &mut self,
        _node: &mut Statement,
        _phase: VisitPhase,
    ) -> Result<VisitAction<Statement>, Self::Error> {
        Ok(VisitAction::Continue)
    }

    /// Fired at `PreVisit`/`InterVisit1`/`InterVisit2`/`PostVisit` around an
    /// `if`'s condition/then-block/else-block, separately from
    /// `visit_statement` so implementors don't have to re-borrow the
    /// enclosing [`Statement`] enum to reach them.
    fn visit_if_structure(
        &mut self,
        _node: &mut IfStatement,
        _phase: VisitPhase,
    ) -> Result<VisitAction<Statement>, Self::Error> {
        Ok(VisitAction::Continue)
    }

    fn visit_expression(
        &mut self,
        _node: &mut Expression,
        _phase: VisitPhase,
    ) -> Result<VisitAction<Expression>, Self::Error> {
        Ok(VisitAction::Continue)
    }

    /// Fired at `InterVisit1` between a binary operation's two operands.
    fn visit_binary_structure(
        &mut self,
        _node: &mut BinaryOperation,
        _phase: VisitPhase,
    ) -> Result<VisitAction<Expression>, Self::Error> {
        Ok(VisitAction::Continue)
    }

    /// Index phase emitted before each item of any statement list (a
    /// [`Line`]'s body or an `if`'s then/else block), carrying the item's
    /// position in that list. Generic over the list's owner so callers
    /// (the printer, in particular) don't need separate hooks per owner
    /// kind to know where one statement ends and the next begins.
    fn visit_statement_list_item(&mut self, _index: usize) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub(crate) fn replace_expr(slot: &mut Expression, replacement: Vec<Expression>) {
    let [single] = <[Expression; 1]>::try_from(replacement).unwrap_or_else(|r| {
        panic!(
            "cannot replace a single expression slot with {} nodes",
            r.len()
        )
    });
    *slot = single;
}

pub fn walk_program<V: YololVisitor + ?Sized>(v: &mut V, program: &mut Program) -> Result<(), V::Error> {
    v.visit_program(program, VisitPhase::PreVisit)?;
    for i in 0..program.lines.len() {
        v.visit_program(program, VisitPhase::Index(i))?;
        walk_line(v, &mut program.lines[i])?;
    }
    v.visit_program(program, VisitPhase::PostVisit)
}

pub fn walk_line<V: YololVisitor + ?Sized>(v: &mut V, line: &mut Line) -> Result<(), V::Error> {
    v.visit_line(line, VisitPhase::PreVisit)?;
    walk_statement_list(v, &mut line.statements)?;
    v.visit_line(line, VisitPhase::PostVisit)
}

pub fn walk_statement_list<V: YololVisitor + ?Sized>(
    v: &mut V,
    list: &mut Vec<Statement>,
) -> Result<(), V::Error> {
    let mut i = 0;
    let mut index = 0;
    while i < list.len() {
        v.visit_statement_list_item(index)?;
        match walk_statement(v, &mut list[i])? {
            VisitAction::Continue => i += 1,
            VisitAction::Replace(replacement) => {
                i = splice_list(list, i, replacement);
            }
        }
        index += 1;
    }
    Ok(())
}

pub fn walk_statement<V: YololVisitor + ?Sized>(
    v: &mut V,
    stmt: &mut Statement,
) -> Result<VisitAction<Statement>, V::Error> {
    if let VisitAction::Replace(r) = v.visit_statement(stmt, VisitPhase::PreVisit)? {
        return Ok(VisitAction::Replace(r));
    }

    match stmt {
        Statement::Assignment(a) => {
            if let VisitAction::Replace(r) = walk_expression(v, &mut a.expr)? {
                replace_expr(&mut a.expr, r);
            }
        }
        Statement::GoTo(_) | Statement::Dereference(_) => {
            if let VisitAction::Replace(r) = v.visit_statement(stmt, VisitPhase::SingleVisit)? {
                return Ok(VisitAction::Replace(r));
            }
        }
        Statement::If(ifs) => {
            if let VisitAction::Replace(r) = v.visit_if_structure(ifs, VisitPhase::PreVisit)? {
                return Ok(VisitAction::Replace(r));
            }
            if let VisitAction::Replace(r) = walk_expression(v, &mut ifs.condition)? {
                replace_expr(&mut ifs.condition, r);
            }
            if let VisitAction::Replace(r) = v.visit_if_structure(ifs, VisitPhase::InterVisit1)? {
                return Ok(VisitAction::Replace(r));
            }
            walk_statement_list(v, &mut ifs.then_block)?;
            if ifs.else_block.is_some() {
                if let VisitAction::Replace(r) = v.visit_if_structure(ifs, VisitPhase::InterVisit2)? {
                    return Ok(VisitAction::Replace(r));
                }
                walk_statement_list(v, ifs.else_block.as_mut().unwrap())?;
            }
            if let VisitAction::Replace(r) = v.visit_if_structure(ifs, VisitPhase::PostVisit)? {
                return Ok(VisitAction::Replace(r));
            }
            return Ok(VisitAction::Continue);
        }
    }

    v.visit_statement(stmt, VisitPhase::PostVisit)
}

pub fn walk_expression<V: YololVisitor + ?Sized>(
    v: &mut V,
    expr: &mut Expression,
) -> Result<VisitAction<Expression>, V::Error> {
    if let VisitAction::Replace(r) = v.visit_expression(expr, VisitPhase::PreVisit)? {
        return Ok(VisitAction::Replace(r));
    }

    match expr {
        Expression::StringConstant(_) | Expression::NumberConstant(_) | Expression::Dereference(_) => {
            if let VisitAction::Replace(r) = v.visit_expression(expr, VisitPhase::SingleVisit)? {
                return Ok(VisitAction::Replace(r));
            }
        }
        Expression::UnaryOperation(u) => {
            if let VisitAction::Replace(r) = walk_expression(v, &mut u.exp)? {
                replace_expr(&mut u.exp, r);
            }
        }
        Expression::BinaryOperation(b) => {
            if let VisitAction::Replace(r) = walk_expression(v, &mut b.l)? {
                replace_expr(&mut b.l, r);
            }
            if let VisitAction::Replace(r) = v.visit_binary_structure(b, VisitPhase::InterVisit1)? {
                return Ok(VisitAction::Replace(r));
            }
            if let VisitAction::Replace(r) = walk_expression(v, &mut b.r)? {
                replace_expr(&mut b.r, r);
            }
        }
        Expression::FuncCall(f) => {
            if let VisitAction::Replace(r) = walk_expression(v, &mut f.arg)? {
                replace_expr(&mut f.arg, r);
            }
        }
    }

    v.visit_expression(expr, VisitPhase::PostVisit)
}
