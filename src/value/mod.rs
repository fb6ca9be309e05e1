//! Runtime values for the YOLOL VM: a decimal number or a string, plus the
//! binary/unary/builtin operations defined over them.
//!
//! Numbers are `rust_decimal::Decimal` rather than a binary float so that
//! arithmetic is exact and reproducible (see [`crate::vm`]'s determinism
//! requirement) -- real YOLOL hardware is decimal, not IEEE-754.

mod error;
mod ops;

pub use error::{ValueError, ValueResult};
pub use ops::{run_binary_operation, run_builtin, run_increment, run_unary_operation};

use std::fmt::Display;

use rust_decimal::Decimal;

/// Division (and modulo) results are rounded to this many fractional
/// digits, matching the original Go source's `decimal.DivisionPrecision = 3`.
pub const DIVISION_PRECISION: u32 = 3;

/// A YOLOL runtime value: either a decimal number or a string.
///
/// Variable names beginning with `:` hold these as shared globals (see
/// [`crate::vm::Coordinator`]); every other name is local to one VM. An
/// uninitialized read of either kind of variable yields `Number(0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Number(Decimal),
    String(String),
}

impl Variable {
    pub fn number(value: impl Into<Decimal>) -> Self {
        Variable::Number(value.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Variable::String(value.into())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Variable::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Variable::String(_))
    }

    /// The canonical decimal string used when a number is coerced to a
    /// string to match a string operand (e.g. `"x = " + 1`).
    pub fn canonical_decimal_string(d: Decimal) -> String {
        d.normalize().to_string()
    }
}

impl Default for Variable {
    /// Uninitialized variable reads yield `Number(0)`.
    fn default() -> Self {
        Variable::Number(Decimal::ZERO)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Number(d) => write!(f, "{}", Variable::canonical_decimal_string(*d)),
            Variable::String(s) => write!(f, "{s}"),
        }
    }
}

/// Truncates (not rounds) `d` to `dp` fractional digits by scaling,
/// truncating toward zero, then scaling back. Used for builtin function
/// results, which the spec mandates be truncated rather than rounded.
pub(crate) fn truncate_dp(d: Decimal, dp: u32) -> Decimal {
    let factor = Decimal::from(10u64.pow(dp));
    (d * factor).trunc() / factor
}

/// Coerces a pair of operands to a common kind before a binary operation is
/// dispatched: if the kinds differ and at least one side is a string, the
/// number side is converted via its canonical decimal string and both sides
/// become strings. Otherwise both sides are returned unchanged.
pub(crate) fn coerce(l: &Variable, r: &Variable) -> (Variable, Variable) {
    match (l, r) {
        (Variable::Number(_), Variable::Number(_)) | (Variable::String(_), Variable::String(_)) => {
            (l.clone(), r.clone())
        }
        (Variable::Number(n), Variable::String(_)) => {
            (Variable::String(Variable::canonical_decimal_string(*n)), r.clone())
        }
        (Variable::String(_), Variable::Number(n)) => {
            (l.clone(), Variable::String(Variable::canonical_decimal_string(*n)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_default_is_zero() {
        assert_eq!(Variable::default(), Variable::Number(Decimal::ZERO));
    }

    #[test]
    fn coerces_number_to_canonical_string() {
        let (l, r) = coerce(&Variable::string("x"), &Variable::number(Decimal::new(150, 2)));
        assert_eq!(l, Variable::string("x"));
        assert_eq!(r, Variable::string("1.5"));
    }

    #[test]
    fn truncates_instead_of_rounds() {
        let d = Decimal::new(19999, 4); // 1.9999
        assert_eq!(truncate_dp(d, 3), Decimal::new(1999, 3));
    }
}
