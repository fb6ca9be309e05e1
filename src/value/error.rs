use std::fmt::Display;

/// A failure from evaluating a value operation: type mismatch, divide by
/// zero, unknown operator/function, or an empty-string `--`.
///
/// Carries no position of its own -- the VM wraps it with the offending
/// node's `start()`/`end()` to build a [`crate::vm::RuntimeError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    pub message: String,
}

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValueError {}

pub type ValueResult<T> = Result<T, ValueError>;
