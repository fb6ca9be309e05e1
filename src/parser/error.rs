use std::fmt::Display;

use crate::lexer::Position;

/// A single parse failure, with an optional chain of nested causes.
///
/// Mirrors the original `ParserError`/`ParserErrors` split: a parser keeps
/// going after a failure (see [`super::Cursor::synchronize`]) and collects
/// every error it hits rather than aborting on the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub start: Position,
    pub end: Position,
    pub causes: Vec<ParseError>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            message: message.into(),
            start,
            end,
            causes: Vec::new(),
        }
    }

    pub fn at(message: impl Into<String>, position: Position) -> Self {
        Self::new(message, position.clone(), position)
    }

    pub fn append(mut self, cause: ParseError) -> Self {
        self.causes.push(cause);
        self
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parser error at {} (up to {}): {}",
            self.start, self.end, self.message
        )?;
        if !self.causes.is_empty() {
            write!(f, "\nFollowing errors:")?;
            for cause in &self.causes {
                write!(f, "\n    {cause}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// A non-empty collection of [`ParseError`]s produced by a single parse run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for err in &self.0 {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

pub type ParseResult<T> = Result<T, ParseError>;
