//! Turns a NOLOL [`Program`](crate::ast::nolol::Program) into a packed YOLOL
//! [`Program`](crate::ast::yolol::Program) the [`crate::vm::Vm`] can run
//! directly.
//!
//! A fixed sequence of passes, each narrowing what the next one has to deal
//! with:
//!
//! 1. [`include`] -- splices every `include`d file's elements in place.
//! 2. [`fold`] -- evaluates every `const` and substitutes its uses.
//! 3. [`rename`] -- shortens local variable names, recording the mapping.
//! 4. [`lowering`] -- desugars `while`/multiline `if`/`wait`/`goto label`
//!    into a flat run of statement lines with symbolic goto sentinels.
//! 5. [`pack`] -- coalesces those lines onto ≤20 physical YOLOL lines under
//!    the 70-char budget.
//! 6. [`lowering::resolve_labels`] -- rewrites the sentinels into the real
//!    line numbers the packer settled on.
//!
//! Label/goto numbering is the only order-sensitive step: it has to happen
//! last, once packing has decided where every label actually landed.

mod error;
mod fold;
mod include;
mod lowering;
mod pack;
mod rename;

pub use error::{ConvertError, ConvertErrorKind, ConvertResult};
pub use include::{FsIncludeLoader, IncludeLoader};

use std::collections::HashMap;
use std::path::Path;

use crate::ast::nolol::Program as NololProgram;
use crate::ast::yolol::Program as YololProgram;
use crate::parser::nolol::parse_program;

/// Maps every original NOLOL variable name the renaming pass touched to the
/// short name it was given in the packed program. Exposed so the test
/// driver can report a failing case using the name the user actually wrote.
pub type VariableTranslationTable = HashMap<String, String>;

/// The result of a successful conversion.
pub struct ConvertedProgram {
    pub program: YololProgram,
    pub variables: VariableTranslationTable,
}

/// Converts an already-parsed NOLOL program. `base_dir` is the directory
/// `include` paths are resolved relative to.
pub fn convert(mut program: NololProgram, base_dir: &Path, loader: &dyn IncludeLoader) -> ConvertResult<ConvertedProgram> {
    include::resolve_includes(&mut program, base_dir, loader)?;
    fold::fold_constants(&mut program)?;
    let variables = rename::rename_variables(&mut program);
    let lowered = lowering::lower(&mut program)?;
    let packed = pack::pack(&lowered.lines)?;
    let mut yolol_program = packed.program;
    lowering::resolve_labels(&mut yolol_program, &lowered.pending_gotos, &packed.label_positions)?;
    Ok(ConvertedProgram {
        program: yolol_program,
        variables,
    })
}

/// Parses `source` as NOLOL and converts it in one step.
pub fn convert_source(source: &str, base_dir: &Path, loader: &dyn IncludeLoader) -> ConvertResult<ConvertedProgram> {
    let program = parse_program(source)?;
    convert(program, base_dir, loader)
}

/// Convenience wrapper for a file on disk, reading it and converting
/// relative to its own parent directory.
pub fn convert_file(path: &Path) -> ConvertResult<ConvertedProgram> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        ConvertError::new(
            ConvertErrorKind::Io,
            format!("failed to read '{}': {e}", path.display()),
            crate::lexer::Position::default(),
            crate::lexer::Position::default(),
        )
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    convert_source(&source, base_dir, &FsIncludeLoader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::yolol::parse_program as parse_yolol;
    use crate::printer::print_yolol;

    fn convert_str(source: &str) -> ConvertedProgram {
        convert_source(source, Path::new(""), &FsIncludeLoader).unwrap()
    }

    #[test]
    fn converts_a_straight_line_program_unchanged_in_spirit() {
        let converted = convert_str("longvar = 1\nlongvar = longvar + 1\n");
        assert_eq!(converted.program.lines.len(), 1);
        assert_eq!(converted.variables.get("longvar").map(String::as_str), Some("a"));
    }

    #[test]
    fn lowers_a_while_loop_into_a_label_free_goto_program() {
        let converted = convert_str("x = 0\nwhile x < 3 do\n  x = x + 1\nend\n");
        let printed = print_yolol(&converted.program);
        // every goto must have resolved to a real, positive line number
        let reparsed = parse_yolol(&printed).expect("packed program must re-parse as plain YOLOL");
        assert_eq!(reparsed.lines.len(), converted.program.lines.len());
        assert!(converted.program.lines.len() <= 20);
    }

    #[test]
    fn lowers_a_multiline_if_with_an_else_branch() {
        let converted = convert_str("if x > 0 then\n  y = 1\nelse\n  y = -1\nend\n");
        assert!(!converted.program.lines.is_empty());
    }

    #[test]
    fn folds_constants_before_renaming_and_lowering() {
        let converted = convert_str("const LIMIT = 5\nwhile x < LIMIT do\n  x = x + 1\nend\n");
        let printed = print_yolol(&converted.program);
        assert!(printed.contains('5'));
    }

    #[test]
    fn rejects_an_unresolved_goto_label() {
        let err = convert_source("goto missing\n", Path::new(""), &FsIncludeLoader).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::UnresolvedLabel);
    }
}
