//! AST -> NOLOL source text.
//!
//! Layers over [`super::yolol`]'s statement/expression printer: every plain
//! [`StatementLine`] defers to it for its YOLOL statements, while the
//! NOLOL-only element kinds (labels, `const`, multiline `if`, `while`,
//! `wait`, `include`, symbolic `goto`) are rendered here, with indentation
//! tracked per block depth the way the original source's block-local
//! handler does.

use crate::ast::nolol::{Block, Element, Program, StatementLine};

use super::yolol::{print_expr, print_statement, LEAF_PRIORITY};

const INDENT: &str = "  ";

pub fn print_program(program: &Program) -> String {
    let mut lines = Vec::new();
    for elem in &program.elements {
        lines.extend(print_element(elem, 0));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn print_block(block: &Block, depth: usize) -> Vec<String> {
    block
        .elements
        .iter()
        .flat_map(|e| print_element(e, depth))
        .collect()
}

fn print_element(elem: &Element, depth: usize) -> Vec<String> {
    let indent = INDENT.repeat(depth);
    match elem {
        Element::Statement(s) => vec![format!("{indent}{}", print_statement_line(s))],
        Element::ConstDecl(c) => vec![format!(
            "{indent}const {} = {}",
            c.display_name,
            print_expr(&c.value, LEAF_PRIORITY, false)
        )],
        Element::GoToLabel(g) => vec![format!("{indent}goto {}", g.label)],
        Element::Include(i) => vec![format!("{indent}include \"{}\"", i.file)],
        Element::Wait(w) => vec![format!(
            "{indent}wait {}",
            print_expr(&w.condition, LEAF_PRIORITY, false)
        )],
        Element::While(w) => {
            let mut lines = vec![format!(
                "{indent}while {} do",
                print_expr(&w.condition, LEAF_PRIORITY, false)
            )];
            lines.extend(print_block(&w.block, depth + 1));
            lines.push(format!("{indent}end"));
            lines
        }
        Element::If(ifs) => {
            let mut lines = Vec::new();
            for (i, (cond, block)) in ifs.conditions.iter().zip(ifs.blocks.iter()).enumerate() {
                let keyword = if i == 0 { "if" } else { "else if" };
                lines.push(format!(
                    "{indent}{keyword} {} then",
                    print_expr(cond, LEAF_PRIORITY, false)
                ));
                lines.extend(print_block(block, depth + 1));
            }
            if let Some(else_block) = &ifs.else_block {
                lines.push(format!("{indent}else"));
                lines.extend(print_block(else_block, depth + 1));
            }
            lines.push(format!("{indent}end"));
            lines
        }
    }
}

/// A label prefix, the statement body (possibly empty), bol/eol packer-hint
/// markers, and a trailing comment all need to survive a round trip, so
/// they're reassembled in the same order the NOLOL parser reads them in.
fn print_statement_line(line: &StatementLine) -> String {
    let mut tokens: Vec<String> = Vec::new();
    if line.has_bol {
        tokens.push("$".to_string());
    }
    if !line.label.is_empty() {
        tokens.push(format!("{}>", line.label));
    }
    for stmt in &line.statements {
        tokens.push(print_statement(stmt));
    }
    if line.has_eol {
        tokens.push("$".to_string());
    }
    let mut out = tokens.join(" ");
    if !line.comment.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str("// ");
        out.push_str(&line.comment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::test_support::clear_nolol_positions;
    use crate::parser::nolol::parse_program;

    fn roundtrip(src: &str) {
        let mut ast = parse_program(src).unwrap();
        let printed = print_program(&ast);
        let mut reparsed = parse_program(&printed).unwrap_or_else(|e| {
            panic!("reprinted source failed to reparse: {printed:?}\n{e}")
        });
        clear_nolol_positions(&mut ast);
        clear_nolol_positions(&mut reparsed);
        assert_eq!(
            ast, reparsed,
            "round trip mismatch\nsource:   {src:?}\nprinted:  {printed:?}"
        );
    }

    #[test]
    fn roundtrips_label_and_plain_line() {
        roundtrip("start> a = 1\nb = 2\n");
    }

    #[test]
    fn roundtrips_const_decl() {
        roundtrip("const FOO = 1 + 2\n");
    }

    #[test]
    fn roundtrips_while_loop() {
        roundtrip("while a < 3 do\n  a++\nend\n");
    }

    #[test]
    fn roundtrips_multiline_if_with_elseif_and_else() {
        roundtrip("if a == 1 then\n  b = 1\nelse if a == 2 then\n  b = 2\nelse\n  b = 3\nend\n");
    }

    #[test]
    fn roundtrips_wait_include_and_goto_label() {
        roundtrip("wait a > 0\ninclude \"lib.nolol\"\ngoto done\ndone> a = 1\n");
    }

    #[test]
    fn roundtrips_bol_eol_markers_and_comment() {
        roundtrip("$loop> a = 1 $ // tick\n");
    }
}
