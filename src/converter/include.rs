//! Resolves `include "file"` directives before any other conversion pass
//! runs, so folding/renaming/lowering all see one flattened NOLOL program.
//!
//! Cycle detection mirrors the loader's own "don't revisit a path already
//! on the current chain" idiom rather than a full graph coloring: a stack
//! of the files currently being resolved, checked before each recursive
//! descent.

use std::io;
use std::path::{Path, PathBuf};

use crate::ast::nolol::{Element, Program};
use crate::ast::Spanned;
use crate::parser::nolol::parse_program_with_file;

use super::error::{ConvertError, ConvertErrorKind, ConvertResult};

/// Supplies the text behind an `include`d path. Abstracted so the converter's
/// cycle detection can be exercised without touching a real filesystem.
pub trait IncludeLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// The default loader: reads straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsIncludeLoader;

impl IncludeLoader for FsIncludeLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

pub(super) fn resolve_includes(
    program: &mut Program,
    base_dir: &Path,
    loader: &dyn IncludeLoader,
) -> ConvertResult<()> {
    let mut visiting = Vec::new();
    resolve_in_elements(&mut program.elements, base_dir, loader, &mut visiting)
}

fn resolve_in_elements(
    elements: &mut Vec<Element>,
    base_dir: &Path,
    loader: &dyn IncludeLoader,
    visiting: &mut Vec<PathBuf>,
) -> ConvertResult<()> {
    let mut i = 0;
    while i < elements.len() {
        match &mut elements[i] {
            Element::Include(include) => {
                let path = base_dir.join(&include.file);
                if visiting.contains(&path) {
                    return Err(ConvertError::new(
                        ConvertErrorKind::IncludeCycle,
                        format!("'{}' is included, directly or indirectly, from itself", include.file),
                        include.start(),
                        include.end(),
                    ));
                }
                let source = loader.load(&path).map_err(|e| {
                    ConvertError::new(
                        ConvertErrorKind::Io,
                        format!("failed to read include '{}': {e}", include.file),
                        include.start(),
                        include.end(),
                    )
                })?;
                let file_label = path.to_string_lossy().into_owned();
                let mut sub = parse_program_with_file(&source, &file_label)?;

                visiting.push(path.clone());
                let sub_base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| base_dir.to_path_buf());
                resolve_in_elements(&mut sub.elements, &sub_base, loader, visiting)?;
                visiting.pop();

                let replacement = sub.elements;
                let inserted = replacement.len();
                elements.splice(i..i + 1, replacement);
                i += inserted;
            }
            Element::If(ifs) => {
                for block in &mut ifs.blocks {
                    resolve_in_elements(&mut block.elements, base_dir, loader, visiting)?;
                }
                if let Some(else_block) = &mut ifs.else_block {
                    resolve_in_elements(&mut else_block.elements, base_dir, loader, visiting)?;
                }
                i += 1;
            }
            Element::While(w) => {
                resolve_in_elements(&mut w.block.elements, base_dir, loader, visiting)?;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::nolol::parse_program;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeLoader(Mutex<HashMap<PathBuf, String>>);

    impl FakeLoader {
        fn new(files: &[(&str, &str)]) -> Self {
            let map = files
                .iter()
                .map(|(name, content)| (PathBuf::from(name), content.to_string()))
                .collect();
            Self(Mutex::new(map))
        }
    }

    impl IncludeLoader for FakeLoader {
        fn load(&self, path: &Path) -> io::Result<String> {
            self.0
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such fake file"))
        }
    }

    #[test]
    fn splices_an_included_program_in_place() {
        let loader = FakeLoader::new(&[("lib.nolol", "const MAX = 10\n")]);
        let mut program = parse_program("include \"lib.nolol\"\na = MAX\n").unwrap();
        resolve_includes(&mut program, Path::new(""), &loader).unwrap();
        assert_eq!(program.elements.len(), 2);
        assert!(matches!(program.elements[0], Element::ConstDecl(_)));
    }

    #[test]
    fn rejects_a_cycle() {
        let loader = FakeLoader::new(&[("a.nolol", "include \"b.nolol\"\n"), ("b.nolol", "include \"a.nolol\"\n")]);
        let mut program = parse_program("include \"a.nolol\"\n").unwrap();
        let err = resolve_includes(&mut program, Path::new(""), &loader).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::IncludeCycle);
    }

    #[test]
    fn reports_a_missing_file() {
        let loader = FakeLoader::new(&[]);
        let mut program = parse_program("include \"missing.nolol\"\n").unwrap();
        let err = resolve_includes(&mut program, Path::new(""), &loader).unwrap_err();
        assert_eq!(err.kind, ConvertErrorKind::Io);
    }
}
