use std::fmt::Display;

use crate::lexer::{LexError, Position};
use crate::parser::ParseErrors;

/// What went wrong while turning a NOLOL program into YOLOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertErrorKind {
    Lex,
    Parse,
    Io,
    IncludeCycle,
    NotConstant,
    UnresolvedLabel,
    ConstRedeclared,
    ProgramTooLong,
}

/// A failure raised at any point in the conversion pipeline: a bad include,
/// a non-literal `const`, an unresolved `goto` label, or a packed program
/// that doesn't fit YOLOL's line/width budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertError {
    pub kind: ConvertErrorKind,
    pub message: String,
    pub start: Position,
    pub end: Position,
}

impl ConvertError {
    pub fn new(kind: ConvertErrorKind, message: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            start,
            end,
        }
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Conversion error at {} (up to {}): {}",
            self.start, self.end, self.message
        )
    }
}

impl std::error::Error for ConvertError {}

impl From<LexError> for ConvertError {
    fn from(err: LexError) -> Self {
        Self::new(ConvertErrorKind::Lex, err.message.clone(), err.position.clone(), err.position)
    }
}

impl From<ParseErrors> for ConvertError {
    fn from(mut errs: ParseErrors) -> Self {
        let first = errs.0.remove(0);
        Self::new(ConvertErrorKind::Parse, first.message, first.start, first.end)
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
