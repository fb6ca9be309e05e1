use crate::lexer::{Position, Token, TokenKind};

use super::error::ParseError;

/// A mutable read-head over a token stream, shared by the YOLOL and NOLOL
/// parsers. Owns error recovery: a failed line is abandoned and the cursor
/// is fast-forwarded to the next newline so the rest of the program still
/// gets parsed (see [`Cursor::synchronize`]).
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn position(&self) -> Position {
        self.peek().position.clone()
    }

    pub fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof)
    }

    pub fn check_symbol(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    pub fn check_symbol_at(&self, offset: usize, symbol: &str) -> bool {
        self.peek_at(offset).is_symbol(symbol)
    }

    pub fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Advances past the current token and returns it.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Skips any number of consecutive newline tokens.
    pub fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    /// Skips whitespace-only lines (one or more bare newlines in a row are
    /// already collapsed by [`Self::skip_newlines`]; this additionally
    /// tolerates a line containing nothing at all).
    pub fn skip_blank_lines(&mut self) {
        self.skip_newlines();
    }

    pub fn expect_symbol(&mut self, symbol: &str) -> Result<Token, ParseError> {
        if self.check_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected '{symbol}' but found '{}'",
                self.describe_current()
            )))
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<Token, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected keyword '{keyword}' but found '{}'",
                self.describe_current()
            )))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<Token, ParseError> {
        if self.check_kind(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected an identifier but found '{}'",
                self.describe_current()
            )))
        }
    }

    pub fn expect_number(&mut self) -> Result<Token, ParseError> {
        if self.check_kind(TokenKind::NumberLiteral) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected a number but found '{}'",
                self.describe_current()
            )))
        }
    }

    pub fn expect_string(&mut self) -> Result<Token, ParseError> {
        if self.check_kind(TokenKind::StringLiteral) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected a string literal but found '{}'",
                self.describe_current()
            )))
        }
    }

    pub fn expect_newline(&mut self) -> Result<(), ParseError> {
        if self.is_newline() {
            if self.peek().kind == TokenKind::Newline {
                self.advance();
            }
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected end of line but found '{}'",
                self.describe_current()
            )))
        }
    }

    fn describe_current(&self) -> String {
        let tok = self.peek();
        if tok.kind == TokenKind::Eof {
            "end of file".to_string()
        } else if tok.kind == TokenKind::Newline {
            "end of line".to_string()
        } else {
            tok.value.clone()
        }
    }

    pub fn error_here(&self, message: impl Into<String>) -> ParseError {
        let start = self.peek().position.clone();
        let end = self.peek().end();
        ParseError::new(message, start, end)
    }

    /// Error recovery: discard tokens up to (and including) the next
    /// newline, or the end of the file, whichever comes first. Used after a
    /// line fails to parse so subsequent lines are still attempted.
    pub fn synchronize(&mut self) {
        while !self.is_newline() {
            self.advance();
        }
        if self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }
}
