//! Tokens -> YOLOL AST.
//!
//! Precedence, lowest to highest: `or`, `and`, comparisons (non-associative),
//! `+ -`, `* / % ^`, unary `not -`, primary. A line is a run of statements
//! read until a newline; a single-line `if ... then ... else ... end` is
//! itself one statement.

use crate::ast::yolol::{
    Assignment, AssignOp, BinaryOperation, Dereference, Expression, FuncCall, GoToStatement,
    IfStatement, Line, NumberConstant, PrePost, Program, Statement, StringConstant, UnaryOp,
    UnaryOperation,
};
use crate::lexer::{Token, TokenKind, Tokenizer};

use super::cursor::Cursor;
use super::error::{ParseError, ParseErrors, ParseResult};
use super::{ADDITIVE_OPS, ASSIGN_OPS, COMPARISON_OPS, MULTIPLICATIVE_OPS};

/// Parses a complete `.yolol` source file into a [`Program`].
///
/// Parse errors are collected rather than aborting on the first one: a line
/// that fails to parse is skipped (see [`Cursor::synchronize`]) and parsing
/// resumes on the next one.
pub fn parse_program(source: &str) -> Result<Program, ParseErrors> {
    let (tokens, comments) = Tokenizer::new(source)
        .tokenize()
        .map_err(|e| ParseErrors(vec![ParseError::at(e.message, e.position)]))?;
    let mut cursor = Cursor::new(tokens);
    let mut errors = Vec::new();
    let mut lines = Vec::new();

    cursor.skip_blank_lines();
    while !cursor.is_eof() {
        match parse_line(&mut cursor) {
            Ok(line) => lines.push(line),
            Err(err) => {
                errors.push(err);
                cursor.synchronize();
            }
        }
        cursor.skip_blank_lines();
    }

    if !errors.is_empty() {
        return Err(ParseErrors(errors));
    }
    Ok(Program { lines, comments })
}

pub(crate) fn parse_line(cursor: &mut Cursor) -> ParseResult<Line> {
    let position = cursor.position();
    let mut statements = Vec::new();
    while !cursor.is_newline() {
        statements.push(parse_statement(cursor)?);
    }
    Ok(Line {
        position,
        statements,
    })
}

pub(crate) fn parse_statement(cursor: &mut Cursor) -> ParseResult<Statement> {
    if cursor.check_keyword("if") {
        return parse_if_statement(cursor).map(Statement::If);
    }
    if cursor.check_keyword("goto") {
        return parse_goto_statement(cursor).map(Statement::GoTo);
    }
    if cursor.check_symbol("++") || cursor.check_symbol("--") {
        return parse_deref_statement(cursor);
    }
    if cursor.check_kind(TokenKind::Identifier) {
        if ASSIGN_OPS
            .iter()
            .any(|op| cursor.check_symbol_at(1, op))
        {
            return parse_assignment(cursor).map(Statement::Assignment);
        }
        if cursor.check_symbol_at(1, "++") || cursor.check_symbol_at(1, "--") {
            return parse_deref_statement(cursor);
        }
        return Err(cursor.error_here(
            "a bare variable is not a valid statement (did you mean an assignment?)",
        ));
    }
    Err(cursor.error_here("expected a statement"))
}

fn parse_assignment(cursor: &mut Cursor) -> ParseResult<Assignment> {
    let var_token = cursor.expect_identifier()?;
    let op_token = cursor.advance();
    let operator = AssignOp::from_symbol(&op_token.value)
        .ok_or_else(|| ParseError::at(format!("unknown assignment operator '{}'", op_token.value), op_token.position.clone()))?;
    let expr = parse_expression(cursor)?;
    Ok(Assignment {
        position: var_token.position,
        variable: var_token.value,
        operator,
        expr,
    })
}

fn parse_deref_statement(cursor: &mut Cursor) -> ParseResult<Statement> {
    parse_dereference(cursor).map(Statement::Dereference)
}

fn parse_dereference(cursor: &mut Cursor) -> ParseResult<Dereference> {
    if cursor.check_symbol("++") || cursor.check_symbol("--") {
        let op_token = cursor.advance();
        let var_token = cursor.expect_identifier()?;
        return Ok(Dereference {
            position: op_token.position,
            variable: var_token.value,
            operator: op_token.value,
            pre_post: PrePost::Pre,
        });
    }
    let var_token = cursor.expect_identifier()?;
    if cursor.check_symbol("++") || cursor.check_symbol("--") {
        let op_token = cursor.advance();
        return Ok(Dereference {
            position: var_token.position,
            variable: var_token.value,
            operator: op_token.value,
            pre_post: PrePost::Post,
        });
    }
    Ok(Dereference {
        position: var_token.position,
        variable: var_token.value,
        operator: String::new(),
        pre_post: PrePost::None,
    })
}

fn parse_goto_statement(cursor: &mut Cursor) -> ParseResult<GoToStatement> {
    let kw = cursor.expect_keyword("goto")?;
    let num_token = cursor.expect_number()?;
    let line = num_token
        .value
        .parse::<i64>()
        .map_err(|_| ParseError::at("goto target must be an integer line number", num_token.position))?;
    Ok(GoToStatement {
        position: kw.position,
        line,
    })
}

fn parse_if_statement(cursor: &mut Cursor) -> ParseResult<IfStatement> {
    let kw = cursor.expect_keyword("if")?;
    let condition = parse_expression(cursor)?;
    cursor.expect_keyword("then")?;
    let then_block = parse_statement_run(cursor, &["else", "end"])?;
    let else_block = if cursor.check_keyword("else") {
        cursor.advance();
        Some(parse_statement_run(cursor, &["end"])?)
    } else {
        None
    };
    cursor.expect_keyword("end")?;
    Ok(IfStatement {
        position: kw.position,
        condition,
        then_block,
        else_block,
    })
}

/// Parses statements until one of `terminators` is seen as the next
/// keyword, used for the branches of a single-line `if`.
fn parse_statement_run(cursor: &mut Cursor, terminators: &[&str]) -> ParseResult<Vec<Statement>> {
    let mut statements = Vec::new();
    while !terminators.iter().any(|t| cursor.check_keyword(t)) {
        if cursor.is_newline() {
            return Err(cursor.error_here("unterminated if-statement (missing 'end')"));
        }
        statements.push(parse_statement(cursor)?);
    }
    Ok(statements)
}

// --- Expressions ------------------------------------------------------

pub(crate) fn parse_expression(cursor: &mut Cursor) -> ParseResult<Expression> {
    parse_or(cursor)
}

fn parse_or(cursor: &mut Cursor) -> ParseResult<Expression> {
    let mut lhs = parse_and(cursor)?;
    while cursor.check_keyword("or") {
        cursor.advance();
        let rhs = parse_and(cursor)?;
        lhs = binary(lhs, "or", rhs);
    }
    Ok(lhs)
}

fn parse_and(cursor: &mut Cursor) -> ParseResult<Expression> {
    let mut lhs = parse_comparison(cursor)?;
    while cursor.check_keyword("and") {
        cursor.advance();
        let rhs = parse_comparison(cursor)?;
        lhs = binary(lhs, "and", rhs);
    }
    Ok(lhs)
}

/// Non-associative: at most one comparison operator per expression level.
fn parse_comparison(cursor: &mut Cursor) -> ParseResult<Expression> {
    let lhs = parse_additive(cursor)?;
    if let Some(op) = COMPARISON_OPS.iter().find(|op| cursor.check_symbol(op)) {
        let op = (*op).to_string();
        cursor.advance();
        let rhs = parse_additive(cursor)?;
        return Ok(binary(lhs, &op, rhs));
    }
    Ok(lhs)
}

fn parse_additive(cursor: &mut Cursor) -> ParseResult<Expression> {
    let mut lhs = parse_multiplicative(cursor)?;
    while let Some(op) = ADDITIVE_OPS.iter().find(|op| cursor.check_symbol(op)) {
        let op = (*op).to_string();
        cursor.advance();
        let rhs = parse_multiplicative(cursor)?;
        lhs = binary(lhs, &op, rhs);
    }
    Ok(lhs)
}

fn parse_multiplicative(cursor: &mut Cursor) -> ParseResult<Expression> {
    let mut lhs = parse_unary(cursor)?;
    while let Some(op) = MULTIPLICATIVE_OPS.iter().find(|op| cursor.check_symbol(op)) {
        let op = (*op).to_string();
        cursor.advance();
        let rhs = parse_unary(cursor)?;
        lhs = binary(lhs, &op, rhs);
    }
    Ok(lhs)
}

fn binary(l: Expression, op: &str, r: Expression) -> Expression {
    Expression::BinaryOperation(BinaryOperation {
        op: op.to_string(),
        l: Box::new(l),
        r: Box::new(r),
    })
}

fn parse_unary(cursor: &mut Cursor) -> ParseResult<Expression> {
    if cursor.check_keyword("not") {
        let kw = cursor.advance();
        let exp = parse_unary(cursor)?;
        return Ok(Expression::UnaryOperation(UnaryOperation {
            position: kw.position,
            op: UnaryOp::Not,
            exp: Box::new(exp),
        }));
    }
    if cursor.check_symbol("-") {
        let sym = cursor.advance();
        let exp = parse_unary(cursor)?;
        return Ok(Expression::UnaryOperation(UnaryOperation {
            position: sym.position,
            op: UnaryOp::Neg,
            exp: Box::new(exp),
        }));
    }
    parse_primary(cursor)
}

fn parse_primary(cursor: &mut Cursor) -> ParseResult<Expression> {
    if cursor.check_symbol("(") {
        cursor.advance();
        let inner = parse_expression(cursor)?;
        cursor.expect_symbol(")")?;
        return Ok(inner);
    }
    if cursor.check_kind(TokenKind::StringLiteral) {
        let tok = cursor.advance();
        return Ok(Expression::StringConstant(StringConstant {
            position: tok.position,
            value: tok.value,
        }));
    }
    if cursor.check_kind(TokenKind::NumberLiteral) {
        let tok = cursor.advance();
        return Ok(Expression::NumberConstant(NumberConstant {
            position: tok.position,
            value: tok.value,
        }));
    }
    if cursor.check_symbol("++") || cursor.check_symbol("--") {
        return parse_dereference(cursor).map(Expression::Dereference);
    }
    if cursor.check_kind(TokenKind::Identifier) {
        if cursor.check_symbol_at(1, "(") {
            return parse_func_call(cursor);
        }
        return parse_dereference(cursor).map(Expression::Dereference);
    }
    Err(cursor.error_here(format!(
        "expected an expression but found '{}'",
        describe(cursor.peek())
    )))
}

fn parse_func_call(cursor: &mut Cursor) -> ParseResult<Expression> {
    let name_token = cursor.expect_identifier()?;
    cursor.expect_symbol("(")?;
    let arg = parse_expression(cursor)?;
    cursor.expect_symbol(")")?;
    Ok(Expression::FuncCall(FuncCall {
        function: name_token.value,
        arg: Box::new(arg),
    }))
}

fn describe(token: &Token) -> &str {
    if token.kind == TokenKind::Eof {
        "end of file"
    } else {
        &token.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_assignment_line() {
        let prog = parse_program("a = 1+2*3\n").unwrap();
        assert_eq!(prog.lines.len(), 1);
        assert_eq!(prog.lines[0].statements.len(), 1);
    }

    #[test]
    fn parses_if_statement() {
        let prog = parse_program("if a > 0 then b = 1 else b = 2 end\n").unwrap();
        let Statement::If(ifs) = &prog.lines[0].statements[0] else {
            panic!("expected if statement");
        };
        assert_eq!(ifs.then_block.len(), 1);
        assert_eq!(ifs.else_block.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn parses_goto() {
        let prog = parse_program("goto 3\n").unwrap();
        let Statement::GoTo(g) = &prog.lines[0].statements[0] else {
            panic!("expected goto");
        };
        assert_eq!(g.line, 3);
    }

    #[test]
    fn parses_pre_and_post_increment() {
        let prog = parse_program("i=0 j=i++ k=++i\n").unwrap();
        assert_eq!(prog.lines[0].statements.len(), 3);
    }

    #[test]
    fn comparisons_are_non_associative() {
        // `a < b < c` is not legal: only one comparison per expression.
        let err = parse_program("a = 1 < 2 < 3\n").unwrap_err();
        assert!(!err.0.is_empty());
    }

    #[test]
    fn collects_multiple_line_errors() {
        let err = parse_program("a = \nb = \n").unwrap_err();
        assert_eq!(err.0.len(), 2);
    }

    #[test]
    fn global_variable_names_parse() {
        let prog = parse_program(":x = 1\n").unwrap();
        let Statement::Assignment(a) = &prog.lines[0].statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(a.variable, ":x");
    }
}
