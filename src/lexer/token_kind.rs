/// The lexical category of a [`crate::lexer::Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    StringLiteral,
    NumberLiteral,
    Symbol,
    Newline,
    Comment,
    Eof,
}

/// Keywords recognized by the tokenizer. NOLOL-only keywords are still
/// recognized when lexing plain YOLOL source; it is the parser's job to
/// reject them where they do not belong.
pub const KEYWORDS: &[&str] = &[
    "if", "then", "else", "end", "goto", "and", "or", "not", "while", "do", "const", "include",
    "wait",
];

/// Multi-character symbols, tried longest-match-first by the tokenizer.
///
/// `>` doubles as NOLOL's label-declaration marker (`loop> ...`) and `$` as
/// its begin-of-line/end-of-line packer hint marker (`$loop> a = 1 $`); both
/// are plain symbols here, the NOLOL parser gives them meaning.
pub const SYMBOLS: &[&str] = &[
    "==", "!=", "<=", ">=", "++", "--", "+=", "-=", "*=", "/=", "%=", "=", "<", ">", "+", "-", "*",
    "/", "%", "^", "(", ")", ",", "$",
];
