//! Parser, compiler, debugger and test-runner toolkit for the YOLOL and
//! NOLOL scripting languages.
//!
//! The pipeline is: [`lexer`] -> [`parser`] -> [`ast`] -> (for NOLOL only)
//! [`converter`] -> [`vm`], with [`printer`] and [`value`] used throughout.

pub mod ast;
pub mod converter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod testfile;
pub mod value;
pub mod vm;

pub use lexer::Position;
