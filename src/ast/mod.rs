//! Abstract syntax trees for both languages, plus the shared visitor
//! framework used by the printer, optimizer passes and the NOLOL->YOLOL
//! converter.

mod node;
mod nolol_visitor;
#[cfg(test)]
pub(crate) mod test_support;
mod visitor;
mod yolol_visitor;

pub mod nolol;
pub mod yolol;

pub use node::Spanned;
pub use nolol_visitor::{walk_program as walk_nolol_program, NololVisitor};
pub use visitor::{VisitAction, VisitPhase};
pub use yolol_visitor::{
    walk_expression, walk_line, walk_program as walk_yolol_program, walk_statement,
    walk_statement_list, YololVisitor,
};
