//! The CLI's own error type: every way a subcommand can fail, wrapped up so
//! `main` has one place to render and pick an exit code from.

use yodk_rs::converter::ConvertError;
use yodk_rs::parser::ParseErrors;
use yodk_rs::testfile::TestError;

#[derive(Debug, thiserror::Error)]
pub enum YodkError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] ParseErrors),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Test(#[from] TestError),

    #[error("'{0}' has no recognized script extension (expected .yolol or .nolol)")]
    UnknownExtension(String),
}
