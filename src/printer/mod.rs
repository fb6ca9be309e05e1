//! Pretty-printers that turn an AST back into source text.
//!
//! Both printers are plain recursive descent rather than visitor-driven;
//! see [`yolol`]'s module docs for why.

pub mod nolol;
pub mod yolol;

pub use nolol::print_program as print_nolol;
pub use yolol::print_program as print_yolol;
