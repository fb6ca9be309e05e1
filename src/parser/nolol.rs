//! Tokens -> NOLOL AST.
//!
//! Reuses the YOLOL expression/statement grammar ([`super::yolol`]) for
//! everything a plain [`crate::ast::nolol::StatementLine`] contains, and adds
//! the NOLOL-only surface forms: label prefixes, `const`, multiline `if`,
//! `while`, `wait`, `include` and symbolic `goto`.
//!
//! Packer hints are spelled with a leading/trailing `$`: `$name> a = 1 $`
//! sets both `has_bol` and `has_eol` on that line.

use crate::ast::nolol::{
    Block, ConstDeclaration, Element, GoToLabelStatement, IncludeDirective, MultilineIf, Program,
    StatementLine, WaitDirective, WhileLoop,
};
use crate::ast::yolol::Statement;
use crate::lexer::{Token, TokenKind, Tokenizer};

use super::cursor::Cursor;
use super::error::{ParseError, ParseErrors, ParseResult};
use super::yolol::{parse_expression, parse_statement};

/// Parses a complete `.nolol` source file into a [`Program`].
pub fn parse_program(source: &str) -> Result<Program, ParseErrors> {
    let (tokens, comments) = Tokenizer::new(source)
        .tokenize()
        .map_err(|e| ParseErrors(vec![ParseError::at(e.message, e.position)]))?;
    parse_tokens(tokens, comments)
}

/// Same as [`parse_program`], but attaches `file` to every position the
/// lexer produces. Used by the converter's include resolution so that nodes
/// originating from an `include`d file report that file's path instead of
/// the including program's.
pub fn parse_program_with_file(source: &str, file: &str) -> Result<Program, ParseErrors> {
    let (tokens, comments) = Tokenizer::with_file(source, file)
        .tokenize()
        .map_err(|e| ParseErrors(vec![ParseError::at(e.message, e.position)]))?;
    parse_tokens(tokens, comments)
}

fn parse_tokens(tokens: Vec<Token>, comments: Vec<Token>) -> Result<Program, ParseErrors> {
    let mut cursor = Cursor::new(tokens);
    let mut comment_cursor = CommentCursor::new(comments);
    let mut errors = Vec::new();
    let mut elements = Vec::new();

    cursor.skip_blank_lines();
    while !cursor.is_eof() {
        match parse_element(&mut cursor, &mut comment_cursor) {
            Ok(elem) => elements.push(elem),
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
    Ok(Program { elements })
}

/// Walks the out-of-band comment list in source order, handing out the
/// comment (if any) that trails a given source line.
struct CommentCursor {
    comments: Vec<Token>,
    next: usize,
}

impl CommentCursor {
    fn new(comments: Vec<Token>) -> Self {
        Self { comments, next: 0 }
    }

    fn take_trailing(&mut self, line: usize) -> String {
        if let Some(tok) = self.comments.get(self.next) {
            if tok.position.line == line {
                self.next += 1;
                return tok.value.trim_start_matches("//").trim().to_string();
            }
        }
        String::new()
    }
}

fn parse_element(cursor: &mut Cursor, comments: &mut CommentCursor) -> ParseResult<Element> {
    if cursor.check_keyword("const") {
        return parse_const_decl(cursor).map(Element::ConstDecl);
    }
    if cursor.check_keyword("while") {
        return parse_while_loop(cursor, comments).map(Element::While);
    }
    if cursor.check_keyword("wait") {
        return parse_wait_directive(cursor).map(Element::Wait);
    }
    if cursor.check_keyword("include") {
        return parse_include_directive(cursor).map(Element::Include);
    }
    if cursor.check_keyword("goto") && cursor.peek_at(1).kind == TokenKind::Identifier {
        return parse_goto_label(cursor).map(Element::GoToLabel);
    }
    if cursor.check_keyword("if") && looks_like_multiline_if(cursor) {
        return parse_multiline_if(cursor, comments).map(Element::If);
    }
    parse_statement_line(cursor, comments).map(Element::Statement)
}

/// Scans forward (without consuming) to the matching `then` and checks
/// whether it is immediately followed by a newline -- that is what
/// distinguishes a multiline `if` from the single-line YOLOL form, which
/// keeps its body on the same physical line.
fn looks_like_multiline_if(cursor: &Cursor) -> bool {
    let mut offset = 1;
    loop {
        let tok = cursor.peek_at(offset);
        if tok.kind == TokenKind::Eof || tok.kind == TokenKind::Newline {
            return false;
        }
        if tok.is_keyword("then") {
            return cursor.peek_at(offset + 1).kind == TokenKind::Newline;
        }
        offset += 1;
    }
}

fn parse_const_decl(cursor: &mut Cursor) -> ParseResult<ConstDeclaration> {
    let kw = cursor.expect_keyword("const")?;
    let name_token = cursor.expect_identifier()?;
    cursor.expect_symbol("=")?;
    let value = parse_expression(cursor)?;
    cursor.expect_newline()?;
    Ok(ConstDeclaration {
        position: kw.position,
        display_name: name_token.value.clone(),
        name: name_token.value,
        value,
    })
}

fn parse_while_loop(cursor: &mut Cursor, comments: &mut CommentCursor) -> ParseResult<WhileLoop> {
    let kw = cursor.expect_keyword("while")?;
    let condition = parse_expression(cursor)?;
    cursor.expect_keyword("do")?;
    cursor.expect_newline()?;
    let block = parse_block(cursor, comments, &["end"])?;
    cursor.expect_keyword("end")?;
    cursor.expect_newline()?;
    Ok(WhileLoop {
        position: kw.position,
        condition,
        block,
    })
}

fn parse_wait_directive(cursor: &mut Cursor) -> ParseResult<WaitDirective> {
    let kw = cursor.expect_keyword("wait")?;
    let condition = parse_expression(cursor)?;
    cursor.expect_newline()?;
    Ok(WaitDirective {
        position: kw.position,
        condition,
    })
}

fn parse_include_directive(cursor: &mut Cursor) -> ParseResult<IncludeDirective> {
    let kw = cursor.expect_keyword("include")?;
    let file_token = cursor.expect_string()?;
    cursor.expect_newline()?;
    Ok(IncludeDirective {
        position: kw.position,
        file: file_token.value,
    })
}

fn parse_goto_label(cursor: &mut Cursor) -> ParseResult<GoToLabelStatement> {
    let kw = cursor.expect_keyword("goto")?;
    let label_token = cursor.expect_identifier()?;
    cursor.expect_newline()?;
    Ok(GoToLabelStatement {
        position: kw.position,
        label: label_token.value,
    })
}

fn parse_multiline_if(cursor: &mut Cursor, comments: &mut CommentCursor) -> ParseResult<MultilineIf> {
    let position = cursor.expect_keyword("if")?.position;
    let mut conditions = Vec::new();
    let mut blocks = Vec::new();
    let mut else_block = None;

    conditions.push(parse_expression(cursor)?);
    cursor.expect_keyword("then")?;
    cursor.expect_newline()?;
    blocks.push(parse_block(cursor, comments, &["else", "end"])?);

    loop {
        if cursor.check_keyword("else") && cursor.peek_at(1).is_keyword("if") {
            cursor.advance();
            cursor.advance();
            conditions.push(parse_expression(cursor)?);
            cursor.expect_keyword("then")?;
            cursor.expect_newline()?;
            blocks.push(parse_block(cursor, comments, &["else", "end"])?);
            continue;
        }
        break;
    }

    if cursor.check_keyword("else") {
        cursor.advance();
        cursor.expect_newline()?;
        else_block = Some(parse_block(cursor, comments, &["end"])?);
    }
    cursor.expect_keyword("end")?;
    cursor.expect_newline()?;

    Ok(MultilineIf {
        position,
        conditions,
        blocks,
        else_block,
    })
}

fn parse_block(cursor: &mut Cursor, comments: &mut CommentCursor, terminators: &[&str]) -> ParseResult<Block> {
    let mut elements = Vec::new();
    cursor.skip_blank_lines();
    while !terminators.iter().any(|t| cursor.check_keyword(t)) && !is_elseif(cursor) {
        if cursor.is_eof() {
            return Err(cursor.error_here("unterminated block (missing 'end')"));
        }
        elements.push(parse_element(cursor, comments)?);
        cursor.skip_blank_lines();
    }
    Ok(Block { elements })
}

fn is_elseif(cursor: &Cursor) -> bool {
    cursor.check_keyword("else") && cursor.peek_at(1).is_keyword("if")
}

fn parse_statement_line(cursor: &mut Cursor, comments: &mut CommentCursor) -> ParseResult<StatementLine> {
    let position = cursor.position();
    let has_bol = cursor.check_symbol("$");
    if has_bol {
        cursor.advance();
    }

    let mut label = String::new();
    if cursor.check_kind(TokenKind::Identifier) && cursor.check_symbol_at(1, ">") {
        label = cursor.advance().value;
        cursor.advance(); // '>'
    }

    let mut statements: Vec<Statement> = Vec::new();
    while !cursor.is_newline() && !cursor.check_symbol("$") {
        statements.push(parse_statement(cursor)?);
    }

    let has_eol = cursor.check_symbol("$");
    if has_eol {
        cursor.advance();
    }

    let comment = comments.take_trailing(position.line);
    cursor.expect_newline()?;

    Ok(StatementLine {
        position,
        statements,
        has_bol,
        has_eol,
        label,
        comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_and_plain_line() {
        let prog = parse_program("start> a = 1\nb = 2\n").unwrap();
        let Element::Statement(s) = &prog.elements[0] else {
            panic!("expected statement line");
        };
        assert_eq!(s.label, "start");
        let Element::Statement(s2) = &prog.elements[1] else {
            panic!("expected statement line");
        };
        assert!(s2.label.is_empty());
    }

    #[test]
    fn parses_const_decl() {
        let prog = parse_program("const FOO = 1 + 2\n").unwrap();
        let Element::ConstDecl(c) = &prog.elements[0] else {
            panic!("expected const decl");
        };
        assert_eq!(c.name, "FOO");
    }

    #[test]
    fn parses_while_loop() {
        let prog = parse_program("while a < 3 do\n  a++\nend\n").unwrap();
        let Element::While(w) = &prog.elements[0] else {
            panic!("expected while loop");
        };
        assert_eq!(w.block.elements.len(), 1);
    }

    #[test]
    fn parses_multiline_if_with_elseif_and_else() {
        let prog = parse_program(
            "if a == 1 then\n  b = 1\nelse if a == 2 then\n  b = 2\nelse\n  b = 3\nend\n",
        )
        .unwrap();
        let Element::If(ifs) = &prog.elements[0] else {
            panic!("expected multiline if");
        };
        assert_eq!(ifs.conditions.len(), 2);
        assert!(ifs.else_block.is_some());
    }

    #[test]
    fn single_line_if_is_a_plain_statement_line() {
        let prog = parse_program("if a > 0 then b = 1 end\n").unwrap();
        assert!(matches!(prog.elements[0], Element::Statement(_)));
    }

    #[test]
    fn parses_wait_and_include_and_goto_label() {
        let prog = parse_program("wait a > 0\ninclude \"lib.nolol\"\ngoto done\ndone> a = 1\n").unwrap();
        assert!(matches!(prog.elements[0], Element::Wait(_)));
        assert!(matches!(prog.elements[1], Element::Include(_)));
        assert!(matches!(prog.elements[2], Element::GoToLabel(_)));
    }

    #[test]
    fn parses_bol_eol_markers() {
        let prog = parse_program("$loop> a = 1 $\n").unwrap();
        let Element::Statement(s) = &prog.elements[0] else {
            panic!("expected statement line");
        };
        assert!(s.has_bol);
        assert!(s.has_eol);
        assert_eq!(s.label, "loop");
    }
}
