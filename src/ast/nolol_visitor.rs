use super::nolol::{
    Block, ConstDeclaration, Element, MultilineIf, Program, StatementLine, WaitDirective, WhileLoop,
};
use super::visitor::{splice_list, VisitAction, VisitPhase};
use super::yolol_visitor::{replace_expr, walk_expression, walk_statement_list, YololVisitor};

/// A pass over the NOLOL AST. Built on top of [`YololVisitor`] so a single
/// pass (e.g. constant folding or variable renaming) can rewrite both NOLOL
/// constructs and the plain yolol statements/expressions nested inside a
/// [`StatementLine`] without juggling two separate visitor objects.
pub trait NololVisitor: YololVisitor {
    fn visit_program(&mut self, _node: &mut Program, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_element(
        &mut self,
        _node: &mut Element,
        _phase: VisitPhase,
    ) -> Result<VisitAction<Element>, Self::Error> {
        Ok(VisitAction::Continue)
    }

    fn visit_statement_line(&mut self, _node: &mut StatementLine, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_const_decl(&mut self, _node: &mut ConstDeclaration, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_block(&mut self, _node: &mut Block, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_if(&mut self, _node: &mut MultilineIf, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_while(&mut self, _node: &mut WhileLoop, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_wait(&mut self, _node: &mut WaitDirective, _phase: VisitPhase) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub fn walk_program<V: NololVisitor + ?Sized>(v: &mut V, program: &mut Program) -> Result<(), V::Error> {
    v.visit_program(program, VisitPhase::PreVisit)?;
    let mut i = 0;
    while i < program.elements.len() {
        v.visit_program(program, VisitPhase::Index(i))?;
        match walk_element(v, &mut program.elements[i])? {
            VisitAction::Continue => i += 1,
            VisitAction::Replace(r) => {
                i = splice_list(&mut program.elements, i, r);
            }
        }
    }
    v.visit_program(program, VisitPhase::PostVisit)
}

pub fn walk_element<V: NololVisitor + ?Sized>(
    v: &mut V,
    elem: &mut Element,
) -> Result<VisitAction<Element>, V::Error> {
    if let VisitAction::Replace(r) = v.visit_element(elem, VisitPhase::PreVisit)? {
        return Ok(VisitAction::Replace(r));
    }

    match elem {
        Element::Statement(s) => walk_statement_line(v, s)?,
        Element::ConstDecl(c) => walk_const_decl(v, c)?,
        Element::If(i) => walk_multiline_if(v, i)?,
        Element::While(w) => walk_while_loop(v, w)?,
        Element::Wait(w) => walk_wait_directive(v, w)?,
        Element::GoToLabel(_) | Element::Include(_) => {
            if let VisitAction::Replace(r) = v.visit_element(elem, VisitPhase::SingleVisit)? {
                return Ok(VisitAction::Replace(r));
            }
        }
    }

    v.visit_element(elem, VisitPhase::PostVisit)
}

fn walk_statement_line<V: NololVisitor + ?Sized>(v: &mut V, line: &mut StatementLine) -> Result<(), V::Error> {
    v.visit_statement_line(line, VisitPhase::PreVisit)?;
    walk_statement_list(v, &mut line.statements)?;
    v.visit_statement_line(line, VisitPhase::PostVisit)
}

fn walk_const_decl<V: NololVisitor + ?Sized>(v: &mut V, decl: &mut ConstDeclaration) -> Result<(), V::Error> {
    v.visit_const_decl(decl, VisitPhase::PreVisit)?;
    if let VisitAction::Replace(r) = walk_expression(v, &mut decl.value)? {
        replace_expr(&mut decl.value, r);
    }
    v.visit_const_decl(decl, VisitPhase::PostVisit)
}

fn walk_block<V: NololVisitor + ?Sized>(v: &mut V, block: &mut Block) -> Result<(), V::Error> {
    v.visit_block(block, VisitPhase::PreVisit)?;
    let mut i = 0;
    while i < block.elements.len() {
        v.visit_block(block, VisitPhase::Index(i))?;
        match walk_element(v, &mut block.elements[i])? {
            VisitAction::Continue => i += 1,
            VisitAction::Replace(r) => {
                i = splice_list(&mut block.elements, i, r);
            }
        }
    }
    v.visit_block(block, VisitPhase::PostVisit)
}

fn walk_multiline_if<V: NololVisitor + ?Sized>(v: &mut V, ifs: &mut MultilineIf) -> Result<(), V::Error> {
    v.visit_if(ifs, VisitPhase::PreVisit)?;
    for i in 0..ifs.conditions.len() {
        v.visit_if(ifs, VisitPhase::Index(i))?;
        if let VisitAction::Replace(r) = walk_expression(v, &mut ifs.conditions[i])? {
            replace_expr(&mut ifs.conditions[i], r);
        }
        v.visit_if(ifs, VisitPhase::InterVisit1)?;
        walk_block(v, &mut ifs.blocks[i])?;
    }
    if ifs.else_block.is_some() {
        v.visit_if(ifs, VisitPhase::InterVisit2)?;
        walk_block(v, ifs.else_block.as_mut().unwrap())?;
    }
    v.visit_if(ifs, VisitPhase::PostVisit)
}

fn walk_while_loop<V: NololVisitor + ?Sized>(v: &mut V, w: &mut WhileLoop) -> Result<(), V::Error> {
    v.visit_while(w, VisitPhase::PreVisit)?;
    if let VisitAction::Replace(r) = walk_expression(v, &mut w.condition)? {
        replace_expr(&mut w.condition, r);
    }
    v.visit_while(w, VisitPhase::InterVisit1)?;
    walk_block(v, &mut w.block)?;
    v.visit_while(w, VisitPhase::PostVisit)
}

fn walk_wait_directive<V: NololVisitor + ?Sized>(v: &mut V, w: &mut WaitDirective) -> Result<(), V::Error> {
    v.visit_wait(w, VisitPhase::PreVisit)?;
    if let VisitAction::Replace(r) = walk_expression(v, &mut w.condition)? {
        replace_expr(&mut w.condition, r);
    }
    v.visit_wait(w, VisitPhase::PostVisit)
}
