//! AST -> YOLOL source text.
//!
//! A plain recursive-descent unparser rather than a generic tree walk: the
//! printer never replaces nodes, so the splice-capable [`crate::ast::YololVisitor`]
//! machinery buys it nothing, and precedence-aware parenthesization is far
//! easier to get right with an explicit "what priority context am I being
//! printed under" parameter than by threading that context through
//! `PreVisit`/`InterVisit1` phases. Shares [`crate::parser::binary_priority`]
//! with the parser so the two can never disagree about what needs grouping.

use std::collections::HashMap;

use crate::ast::yolol::{Dereference, Expression, IfStatement, Line, PrePost, Program, Statement, UnaryOp};
use crate::lexer::Token;
use crate::parser::binary_priority;

/// Priority assigned to a unary operation when deciding whether *it* needs
/// parenthesizing as someone else's child, and the priority context handed
/// to *its own* operand. Higher than every binary operator's priority,
/// matching the grammar (`unary` binds tighter than any binary op).
const UNARY_PRIORITY: u8 = 4;

/// Priority of anything that can never need parenthesizing as a child:
/// constants, dereferences, function calls, and the top-level call into an
/// expression that has no enclosing operator at all.
pub(crate) const LEAF_PRIORITY: u8 = 10;

/// Prints every [`Line`], then re-attaches each collected comment either as
/// a trailing comment on the line it was lexed from (same source line
/// number) or, for a comment on a line with no statements of its own, as a
/// standalone line appended after everything else.
pub fn print_program(program: &Program) -> String {
    let mut trailing: HashMap<usize, Vec<&Token>> = HashMap::new();
    let mut standalone: Vec<&Token> = Vec::new();
    for comment in &program.comments {
        let line_no = comment.position.line;
        if program.lines.iter().any(|l| l.position.line == line_no) {
            trailing.entry(line_no).or_default().push(comment);
        } else {
            standalone.push(comment);
        }
    }

    let mut out_lines: Vec<String> = program
        .lines
        .iter()
        .map(|line| {
            let mut text = print_line(line);
            if let Some(comments) = trailing.get(&line.position.line) {
                for comment in comments {
                    text.push(' ');
                    text.push_str(&comment.value);
                }
            }
            text
        })
        .collect();
    out_lines.extend(standalone.into_iter().map(|c| c.value.clone()));

    let mut out = out_lines.join("\n");
    out.push('\n');
    out
}

pub fn print_line(line: &Line) -> String {
    print_statement_list(&line.statements)
}

pub fn print_statement_list(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(print_statement)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_statement(stmt: &Statement) -> String {
    match stmt {
        Statement::Assignment(a) => format!(
            "{} {} {}",
            a.variable,
            a.operator.symbol(),
            print_expr(&a.expr, LEAF_PRIORITY, false)
        ),
        Statement::If(ifs) => print_if_statement(ifs),
        Statement::GoTo(g) => format!("goto {}", g.line),
        Statement::Dereference(d) => print_dereference(d),
    }
}

fn print_if_statement(ifs: &IfStatement) -> String {
    let cond = print_expr(&ifs.condition, LEAF_PRIORITY, false);
    let then_body = print_statement_list(&ifs.then_block);
    match &ifs.else_block {
        Some(else_body) => format!(
            "if {cond} then {then_body} else {} end",
            print_statement_list(else_body)
        ),
        None => format!("if {cond} then {then_body} end"),
    }
}

fn print_dereference(d: &Dereference) -> String {
    match d.pre_post {
        PrePost::Pre => format!("{}{}", d.operator, d.variable),
        PrePost::Post => format!("{}{}", d.variable, d.operator),
        PrePost::None => d.variable.clone(),
    }
}

/// Formats `expr`, wrapping it in parentheses iff it is being printed as an
/// operand under `parent_priority` and its own priority would otherwise
/// reparse into a different tree (lower priority than the parent, or equal
/// priority on the non-associative side -- see [`needs_parens`]).
pub fn print_expr(expr: &Expression, parent_priority: u8, is_right_child: bool) -> String {
    match expr {
        Expression::StringConstant(s) => format!("\"{}\"", escape_string(&s.value)),
        Expression::NumberConstant(n) => n.value.clone(),
        Expression::Dereference(d) => print_dereference(d),
        Expression::UnaryOperation(u) => {
            let operand = print_expr(&u.exp, UNARY_PRIORITY, false);
            let body = match u.op {
                UnaryOp::Neg => format!("- {operand}"),
                UnaryOp::Not => format!("not {operand}"),
            };
            wrap_if_needed(body, UNARY_PRIORITY, parent_priority, is_right_child)
        }
        Expression::BinaryOperation(b) => {
            let my_priority = binary_priority(&b.op);
            let l = print_expr(&b.l, my_priority, false);
            let r = print_expr(&b.r, my_priority, true);
            let body = format!("{l} {} {r}", b.op);
            wrap_if_needed(body, my_priority, parent_priority, is_right_child)
        }
        Expression::FuncCall(f) => format!(
            "{}({})",
            f.function,
            // The call's own parens already group the argument; it never
            // needs an extra layer regardless of its own priority.
            print_expr(&f.arg, LEAF_PRIORITY, false)
        ),
    }
}

fn wrap_if_needed(body: String, my_priority: u8, parent_priority: u8, is_right_child: bool) -> String {
    if needs_parens(my_priority, parent_priority, is_right_child) {
        format!("({body})")
    } else {
        body
    }
}

/// `my_priority` is the priority of the node about to be printed;
/// `parent_priority` is the priority of the operator it is an operand of
/// (or [`LEAF_PRIORITY`] if there is no enclosing operator at all).
fn needs_parens(my_priority: u8, parent_priority: u8, is_right_child: bool) -> bool {
    if my_priority < parent_priority {
        return true;
    }
    if my_priority == parent_priority {
        // Comparisons are non-associative: the grammar never nests one
        // directly inside another, so any such nesting (e.g. produced by
        // an optimizer pass) must always be grouped to reparse correctly.
        if parent_priority == binary_priority("==") {
            return true;
        }
        // All binary operators here are left-associative: an operand of
        // equal priority on the right must be grouped, on the left it
        // naturally reparses the same way without parens.
        return is_right_child;
    }
    false
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::test_support::clear_yolol_positions;
    use crate::parser::yolol::parse_program;

    fn roundtrip(src: &str) {
        let mut ast = parse_program(src).unwrap();
        let printed = print_program(&ast);
        let mut reparsed = parse_program(&printed).unwrap_or_else(|e| {
            panic!("reprinted source failed to reparse: {printed:?}\n{e}")
        });
        clear_yolol_positions(&mut ast);
        clear_yolol_positions(&mut reparsed);
        assert_eq!(
            ast, reparsed,
            "round trip mismatch\nsource:   {src:?}\nprinted:  {printed:?}"
        );
    }

    #[test]
    fn roundtrips_simple_arithmetic() {
        roundtrip("a = 1+2*3 b = (1+2)*3\n");
    }

    #[test]
    fn roundtrips_redundant_parens_away() {
        // `(1+2)+3` doesn't need its parens (left-assoc, equal priority on
        // the left); the printer should still reparse identically even
        // though it won't reproduce them.
        let ast = parse_program("a = (1+2)+3\n").unwrap();
        let printed = print_program(&ast);
        assert!(!printed.contains('('));
    }

    #[test]
    fn keeps_parens_needed_on_the_right() {
        let ast = parse_program("a = 1-(2-3)\n").unwrap();
        let printed = print_program(&ast);
        assert!(printed.contains('('));
        roundtrip("a = 1-(2-3)\n");
    }

    #[test]
    fn roundtrips_if_statement() {
        roundtrip("if a > 0 then b = 1 else b = 2 end\n");
    }

    #[test]
    fn roundtrips_goto_and_increment() {
        roundtrip("i=0 j=i++ k=++i\ngoto 1\n");
    }

    #[test]
    fn roundtrips_unary_and_string_ops() {
        roundtrip("a = -1\nb = not a\nc = -(1+2)\ns = \"hi\\nthere\" - \"there\"\n");
    }

    #[test]
    fn roundtrips_nested_unary_with_separating_space() {
        let ast = parse_program("a = - -1\n").unwrap();
        let printed = print_program(&ast);
        assert!(!printed.contains("--"));
        roundtrip("a = - -1\n");
    }

    #[test]
    fn keeps_a_trailing_comment_on_its_own_line() {
        let ast = parse_program("a = 1 //note\n").unwrap();
        assert_eq!(ast.comments.len(), 1);
        let printed = print_program(&ast);
        assert!(printed.contains("//note"), "{printed:?}");
        roundtrip("a = 1 //note\n");
    }

    #[test]
    fn keeps_a_comment_only_line_as_its_own_standalone_line() {
        let ast = parse_program("//just a note\na = 1\n").unwrap();
        assert_eq!(ast.comments.len(), 1);
        let printed = print_program(&ast);
        assert!(printed.contains("//just a note"), "{printed:?}");
        roundtrip("//just a note\na = 1\n");
    }
}
