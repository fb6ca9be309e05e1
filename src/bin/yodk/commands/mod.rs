pub mod compile;
pub mod debug;
pub mod run;
pub mod test;

use std::path::Path;

use yodk_rs::ast::yolol::Program;
use yodk_rs::converter::{convert_source, FsIncludeLoader, VariableTranslationTable};
use yodk_rs::parser::yolol::parse_program;

use crate::error::YodkError;

/// Loads a script by extension: `.yolol` is parsed directly, `.nolol` is
/// parsed and converted. Returns the resulting YOLOL program plus the
/// variable translation table (empty for a `.yolol` script).
pub fn load_program(path: &Path) -> Result<(Program, VariableTranslationTable), YodkError> {
    let source = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yolol") => Ok((parse_program(&source)?, VariableTranslationTable::new())),
        Some("nolol") => {
            let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
            let converted = convert_source(&source, base_dir, &FsIncludeLoader)?;
            Ok((converted.program, converted.variables))
        }
        _ => Err(YodkError::UnknownExtension(path.display().to_string())),
    }
}
