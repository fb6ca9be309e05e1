//! Constant folding and propagation: every `const NAME = expr` is evaluated
//! down to a literal [`Variable`] at conversion time (reusing the VM's own
//! operator implementations, so folding agrees with runtime semantics by
//! construction) and every subsequent bare read of `NAME` is replaced with
//! that literal. Declarations are removed once folded; nothing about a
//! `const` survives into the YOLOL output.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::nolol::{Element, Program};
use crate::ast::yolol::{Expression, NumberConstant, Statement, StringConstant};
use crate::ast::Spanned;
use crate::lexer::Position;
use crate::value::{run_binary_operation, run_builtin, run_unary_operation, Variable};

use super::error::{ConvertError, ConvertErrorKind, ConvertResult};

pub(super) fn fold_constants(program: &mut Program) -> ConvertResult<()> {
    let mut consts = HashMap::new();
    fold_elements(&mut program.elements, &mut consts)
}

fn fold_elements(elements: &mut Vec<Element>, consts: &mut HashMap<String, Variable>) -> ConvertResult<()> {
    let mut i = 0;
    while i < elements.len() {
        match &mut elements[i] {
            Element::ConstDecl(c) => {
                if consts.contains_key(&c.name) {
                    return Err(ConvertError::new(
                        ConvertErrorKind::ConstRedeclared,
                        format!("'{}' is already declared as a constant", c.display_name),
                        c.start(),
                        c.end(),
                    ));
                }
                let value = eval_const_expr(&c.value, consts)?;
                consts.insert(c.name.clone(), value);
                elements.remove(i);
            }
            Element::Statement(s) => {
                substitute_statements(&mut s.statements, consts);
                i += 1;
            }
            Element::If(ifs) => {
                for cond in &mut ifs.conditions {
                    substitute_expr(cond, consts);
                }
                for block in &mut ifs.blocks {
                    fold_elements(&mut block.elements, consts)?;
                }
                if let Some(else_block) = &mut ifs.else_block {
                    fold_elements(&mut else_block.elements, consts)?;
                }
                i += 1;
            }
            Element::While(w) => {
                substitute_expr(&mut w.condition, consts);
                fold_elements(&mut w.block.elements, consts)?;
                i += 1;
            }
            Element::Wait(w) => {
                substitute_expr(&mut w.condition, consts);
                i += 1;
            }
            Element::GoToLabel(_) | Element::Include(_) => {
                i += 1;
            }
        }
    }
    Ok(())
}

fn eval_const_expr(expr: &Expression, consts: &HashMap<String, Variable>) -> ConvertResult<Variable> {
    match expr {
        Expression::StringConstant(s) => Ok(Variable::String(s.value.clone())),
        Expression::NumberConstant(n) => Decimal::from_str(&n.value).map(Variable::Number).map_err(|_| {
            ConvertError::new(
                ConvertErrorKind::NotConstant,
                format!("invalid number literal '{}'", n.value),
                expr.start(),
                expr.end(),
            )
        }),
        Expression::Dereference(d) if d.operator.is_empty() => consts.get(&d.variable).cloned().ok_or_else(|| {
            ConvertError::new(
                ConvertErrorKind::NotConstant,
                format!("'{}' is not a constant", d.variable),
                d.start(),
                d.end(),
            )
        }),
        Expression::Dereference(d) => Err(ConvertError::new(
            ConvertErrorKind::NotConstant,
            "constant expressions cannot use ++/--",
            d.start(),
            d.end(),
        )),
        Expression::UnaryOperation(u) => {
            let operand = eval_const_expr(&u.exp, consts)?;
            run_unary_operation(u.op, &operand)
                .map_err(|e| ConvertError::new(ConvertErrorKind::NotConstant, e.message, expr.start(), expr.end()))
        }
        Expression::BinaryOperation(b) => {
            let l = eval_const_expr(&b.l, consts)?;
            let r = eval_const_expr(&b.r, consts)?;
            run_binary_operation(&b.op, &l, &r)
                .map_err(|e| ConvertError::new(ConvertErrorKind::NotConstant, e.message, expr.start(), expr.end()))
        }
        Expression::FuncCall(f) => {
            let arg = eval_const_expr(&f.arg, consts)?;
            run_builtin(&f.function, &arg)
                .map_err(|e| ConvertError::new(ConvertErrorKind::NotConstant, e.message, expr.start(), expr.end()))
        }
    }
}

fn literal_expr(value: &Variable, position: &Position) -> Expression {
    match value {
        Variable::Number(n) => Expression::NumberConstant(NumberConstant {
            position: position.clone(),
            value: Variable::canonical_decimal_string(*n),
        }),
        Variable::String(s) => Expression::StringConstant(StringConstant {
            position: position.clone(),
            value: s.clone(),
        }),
    }
}

fn substitute_expr(expr: &mut Expression, consts: &HashMap<String, Variable>) {
    match expr {
        Expression::Dereference(d) if d.operator.is_empty() => {
            if let Some(value) = consts.get(&d.variable) {
                *expr = literal_expr(value, &d.position);
            }
        }
        Expression::UnaryOperation(u) => substitute_expr(&mut u.exp, consts),
        Expression::BinaryOperation(b) => {
            substitute_expr(&mut b.l, consts);
            substitute_expr(&mut b.r, consts);
        }
        Expression::FuncCall(f) => substitute_expr(&mut f.arg, consts),
        _ => {}
    }
}

fn substitute_statements(stmts: &mut [Statement], consts: &HashMap<String, Variable>) {
    for stmt in stmts {
        substitute_statement(stmt, consts);
    }
}

fn substitute_statement(stmt: &mut Statement, consts: &HashMap<String, Variable>) {
    match stmt {
        Statement::Assignment(a) => substitute_expr(&mut a.expr, consts),
        Statement::If(ifs) => {
            substitute_expr(&mut ifs.condition, consts);
            substitute_statements(&mut ifs.then_block, consts);
            if let Some(else_block) = &mut ifs.else_block {
                substitute_statements(else_block, consts);
            }
        }
        Statement::GoTo(_) | Statement::Dereference(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::nolol::parse_program;

    #[test]
    fn folds_simple_constant_into_its_uses() {
        let mut program = parse_program("const MAX = 10\na = MAX + 1\n").unwrap();
        fold_constants(&mut program).unwrap();
        assert_eq!(program.elements.len(), 1);
        let Element::Statement(line) = &program.elements[0] else {
            panic!("expected a statement line");
        };
        let Statement::Assignment(a) = &line.statements[0] else {
            panic!("expected an assignment");
        };
        let Expression::BinaryOperation(b) = &a.expr else {
            panic!("expected a binary operation");
        };
        assert!(matches!(&*b.l, Expression::NumberConstant(n) if n.value == "10"));
    }

    #[test]
    fn folds_constant_defined_in_terms_of_another() {
        let mut program = parse_program("const A = 2\nconst B = A * 3\nc = B\n").unwrap();
        fold_constants(&mut program).unwrap();
        let Element::Statement(line) = &program.elements[0] else {
            panic!("expected a statement line");
        };
        let Statement::Assignment(a) = &line.statements[0] else {
            panic!("expected an assignment");
        };
        assert!(matches!(&a.expr, Expression::NumberConstant(n) if n.value == "6"));
    }

    #[test]
    fn rejects_redeclared_constant() {
        let mut program = parse_program("const A = 1\nconst A = 2\n").unwrap();
        let err = fold_constants(&mut program).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::ConstRedeclared);
    }

    #[test]
    fn rejects_non_constant_initializer() {
        let mut program = parse_program("const A = b\n").unwrap();
        let err = fold_constants(&mut program).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::NotConstant);
    }
}
