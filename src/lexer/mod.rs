//! Tokenizer shared by the YOLOL and NOLOL parsers.
//!
//! A single forward pass over the source turns it into a flat [`Token`]
//! stream. Comments are not discarded: they are collected separately so that
//! the printer can reattach them to the program root for round-trip output.
mod error;
mod position;
mod token;
mod token_kind;

pub use error::{LexError, LexResult};
pub use position::Position;
pub use token::Token;
pub use token_kind::{TokenKind, KEYWORDS, SYMBOLS};

use std::{iter::Peekable, str::Chars};

/// Breaks YOLOL/NOLOL source text into a stream of [`Token`]s.
///
/// `file` is attached to every position produced by this tokenizer; pass an
/// empty string for the top-level source and the included file's relative
/// path when lexing the contents of an `include`.
pub struct Tokenizer<'a> {
    file: String,
    iterator: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    comments: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_file(input, "")
    }

    pub fn with_file(input: &'a str, file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            iterator: input.chars().peekable(),
            line: 1,
            column: 1,
            tokens: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Tokenizes the entire input, returning the token stream (terminated by
    /// an `Eof` token) and the comments collected along the way.
    pub fn tokenize(mut self) -> LexResult<(Vec<Token>, Vec<Token>)> {
        loop {
            self.skip_whitespace();
            let Some(next) = self.peek() else {
                break;
            };
            match next {
                '\n' => self.lex_newline(),
                '/' if self.peek_ahead() == Some('/') => self.lex_comment(),
                '"' => self.lex_string()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),
                ':' if self.peek_ahead().is_some_and(|c| c.is_alphabetic() || c == '_') => {
                    self.lex_identifier_or_keyword()
                }
                '0'..='9' => self.lex_number()?,
                '.' if self.peek_ahead().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                _ => self.lex_symbol()?,
            }
        }
        let eof_pos = self.position();
        self.tokens.push(Token::new(TokenKind::Eof, "", eof_pos));
        Ok((self.tokens, self.comments))
    }

    fn position(&self) -> Position {
        Position::in_file(self.file.clone(), self.line, self.column)
    }

    fn peek(&mut self) -> Option<char> {
        self.iterator.peek().copied()
    }

    fn peek_ahead(&self) -> Option<char> {
        let mut clone = self.iterator.clone();
        clone.next();
        clone.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.iterator.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn lex_newline(&mut self) {
        let position = self.position();
        self.advance();
        self.tokens
            .push(Token::new(TokenKind::Newline, "\n", position));
    }

    fn lex_comment(&mut self) {
        let position = self.position();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        self.comments
            .push(Token::new(TokenKind::Comment, text, position));
    }

    fn lex_string(&mut self) -> LexResult<()> {
        let position = self.position();
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        position,
                    })
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(LexError {
                            message: "unterminated escape sequence".into(),
                            position,
                        })
                    }
                },
                Some(c) => value.push(c),
            }
        }
        self.tokens
            .push(Token::new(TokenKind::StringLiteral, value, position));
        Ok(())
    }

    fn lex_identifier_or_keyword(&mut self) {
        let position = self.position();
        let mut value = String::new();
        if self.peek() == Some(':') {
            value.push(':');
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&value.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.tokens.push(Token::new(kind, value, position));
    }

    fn lex_number(&mut self) -> LexResult<()> {
        let position = self.position();
        let mut value = String::new();
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '.' && !seen_dot && self.peek_ahead().is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.tokens
            .push(Token::new(TokenKind::NumberLiteral, value, position));
        Ok(())
    }

    fn lex_symbol(&mut self) -> LexResult<()> {
        let position = self.position();
        for candidate in SYMBOLS {
            if self.matches_ahead(candidate) {
                for _ in 0..candidate.chars().count() {
                    self.advance();
                }
                self.tokens
                    .push(Token::new(TokenKind::Symbol, *candidate, position));
                return Ok(());
            }
        }
        let bad = self.peek().unwrap();
        Err(LexError {
            message: format!("unexpected character '{bad}'"),
            position,
        })
    }

    fn matches_ahead(&self, candidate: &str) -> bool {
        let mut clone = self.iterator.clone();
        for expected in candidate.chars() {
            match clone.next() {
                Some(c) if c == expected => continue,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        let (tokens, _) = Tokenizer::new(src).tokenize().unwrap();
        tokens
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn lexes_assignment_line() {
        let got = kinds("a = 1+2*3\n");
        assert_eq!(
            got,
            vec![
                (TokenKind::Identifier, "a".into()),
                (TokenKind::Symbol, "=".into()),
                (TokenKind::NumberLiteral, "1".into()),
                (TokenKind::Symbol, "+".into()),
                (TokenKind::NumberLiteral, "2".into()),
                (TokenKind::Symbol, "*".into()),
                (TokenKind::NumberLiteral, "3".into()),
                (TokenKind::Newline, "\n".into()),
                (TokenKind::Eof, "".into()),
            ]
        );
    }

    #[test]
    fn lexes_increment_before_plus() {
        let got = kinds("i++");
        assert_eq!(
            got,
            vec![
                (TokenKind::Identifier, "i".into()),
                (TokenKind::Symbol, "++".into()),
                (TokenKind::Eof, "".into()),
            ]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        let (tokens, _) = Tokenizer::new("\"hi\\nthere\"").tokenize().unwrap();
        assert_eq!(tokens[0].value, "hi\nthere");
    }

    #[test]
    fn collects_comments_separately() {
        let (tokens, comments) = Tokenizer::new("a = 1 // hello\n").tokenize().unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Comment));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].value, "// hello");
    }

    #[test]
    fn global_variable_name_keeps_its_colon_prefix() {
        let got = kinds(":x = 1\n");
        assert_eq!(got[0], (TokenKind::Identifier, ":x".into()));
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = Tokenizer::new("\"abc").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
