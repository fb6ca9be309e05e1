use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};

use crate::ast::yolol::UnaryOp;

use super::{coerce, truncate_dp, ValueError, ValueResult, Variable, DIVISION_PRECISION};

/// Evaluates a binary operator over two already-evaluated operands.
///
/// Operands are coerced to a common kind first (see [`coerce`]); the
/// operator is then dispatched on that common kind, so e.g. `1 + "a"` is
/// really `"1" + "a"` by the time [`string_binary`] sees it.
pub fn run_binary_operation(op: &str, l: &Variable, r: &Variable) -> ValueResult<Variable> {
    let (l, r) = coerce(l, r);
    match (&l, &r) {
        (Variable::Number(a), Variable::Number(b)) => numeric_binary(op, *a, *b),
        (Variable::String(a), Variable::String(b)) => string_binary(op, a, b),
        _ => unreachable!("coerce() always returns operands of matching kind"),
    }
}

fn numeric_binary(op: &str, a: Decimal, b: Decimal) -> ValueResult<Variable> {
    let as_bool = |v: bool| Variable::Number(if v { Decimal::ONE } else { Decimal::ZERO });
    let result = match op {
        "+" => Variable::Number(a + b),
        "-" => Variable::Number(a - b),
        "*" => Variable::Number(a * b),
        "/" => {
            if b.is_zero() {
                return Err(ValueError::new("division by zero"));
            }
            Variable::Number((a / b).round_dp(DIVISION_PRECISION))
        }
        "%" => {
            if b.is_zero() {
                return Err(ValueError::new("division by zero"));
            }
            Variable::Number((a % b).round_dp(DIVISION_PRECISION))
        }
        "^" => Variable::Number(decimal_pow(a, b)),
        "==" => as_bool(a == b),
        "!=" => as_bool(a != b),
        "<" => as_bool(a < b),
        "<=" => as_bool(a <= b),
        ">" => as_bool(a > b),
        ">=" => as_bool(a >= b),
        "and" => as_bool(!a.is_zero() && !b.is_zero()),
        "or" => as_bool(!a.is_zero() || !b.is_zero()),
        _ => return Err(ValueError::new(format!("unknown binary operator '{op}'"))),
    };
    Ok(result)
}

fn string_binary(op: &str, a: &str, b: &str) -> ValueResult<Variable> {
    match op {
        "+" => Ok(Variable::String(format!("{a}{b}"))),
        "-" => Ok(Variable::String(remove_last_occurrence(a, b))),
        "==" => Ok(bool_var(a == b)),
        "!=" => Ok(bool_var(a != b)),
        _ => Err(ValueError::new(format!(
            "operator '{op}' is not defined for strings"
        ))),
    }
}

fn bool_var(v: bool) -> Variable {
    Variable::Number(if v { Decimal::ONE } else { Decimal::ZERO })
}

/// Removes the last occurrence of `needle` from `haystack`, returning
/// `haystack` unchanged if `needle` does not occur in it.
fn remove_last_occurrence(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    match haystack.rfind(needle) {
        Some(idx) => {
            let mut out = String::with_capacity(haystack.len() - needle.len());
            out.push_str(&haystack[..idx]);
            out.push_str(&haystack[idx + needle.len()..]);
            out
        }
        None => haystack.to_string(),
    }
}

pub fn run_unary_operation(op: UnaryOp, v: &Variable) -> ValueResult<Variable> {
    match (op, v) {
        (UnaryOp::Neg, Variable::Number(n)) => Ok(Variable::Number(-n)),
        (UnaryOp::Not, Variable::Number(n)) => {
            Ok(bool_var(n.is_zero()))
        }
        (UnaryOp::Neg, Variable::String(_)) => {
            Err(ValueError::new("unary '-' is not defined on strings"))
        }
        (UnaryOp::Not, Variable::String(_)) => {
            Err(ValueError::new("unary 'not' is not defined on strings"))
        }
    }
}

/// Applies `++`/`--` to an already-evaluated dereference target, returning
/// the *new* value that should be stored back. Numbers step by one; strings
/// grow by a trailing space (`++`) or shrink by their last character (`--`,
/// an error if the string is already empty).
pub fn run_increment(op: &str, v: &Variable) -> ValueResult<Variable> {
    match (op, v) {
        ("++", Variable::Number(n)) => Ok(Variable::Number(n + Decimal::ONE)),
        ("--", Variable::Number(n)) => Ok(Variable::Number(n - Decimal::ONE)),
        ("++", Variable::String(s)) => Ok(Variable::String(format!("{s} "))),
        ("--", Variable::String(s)) => {
            if s.is_empty() {
                Err(ValueError::new("cannot decrement an empty string"))
            } else {
                let mut out = s.clone();
                out.pop();
                Ok(Variable::String(out))
            }
        }
        _ => Err(ValueError::new(format!("unknown increment operator '{op}'"))),
    }
}

const BUILTIN_FUNCTIONS: &[&str] = &["abs", "sqrt", "sin", "cos", "tan", "asin", "acos", "atan"];

pub fn run_builtin(name: &str, arg: &Variable) -> ValueResult<Variable> {
    if !BUILTIN_FUNCTIONS.contains(&name) {
        return Err(ValueError::new(format!("unknown function '{name}'")));
    }
    let Variable::Number(n) = arg else {
        return Err(ValueError::new(format!(
            "function '{name}' expects a number argument"
        )));
    };
    let result = match name {
        "abs" => n.abs(),
        "sqrt" => {
            if n.is_sign_negative() {
                return Err(ValueError::new("sqrt of a negative number"));
            }
            from_f64(to_f64(*n).sqrt())
        }
        "sin" => from_f64(to_f64(*n).sin()),
        "cos" => from_f64(to_f64(*n).cos()),
        "tan" => from_f64(to_f64(*n).tan()),
        "asin" => from_f64(to_f64(*n).asin()),
        "acos" => from_f64(to_f64(*n).acos()),
        "atan" => from_f64(to_f64(*n).atan()),
        _ => unreachable!("checked against BUILTIN_FUNCTIONS above"),
    };
    Ok(Variable::Number(truncate_dp(result, 3)))
}

fn decimal_pow(base: Decimal, exp: Decimal) -> Decimal {
    if exp.fract().is_zero() && exp.abs() < Decimal::from(64) {
        if let Some(i) = exp.to_i64() {
            return base.powi(i);
        }
    }
    from_f64(to_f64(base).powf(to_f64(exp)))
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn from_f64(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_is_rounded_to_three_places() {
        let got = run_binary_operation("/", &Variable::number(Decimal::ONE), &Variable::number(Decimal::from(3)))
            .unwrap();
        assert_eq!(got, Variable::Number(Decimal::new(333, 3)));
    }

    #[test]
    fn division_by_zero_errors() {
        let err = run_binary_operation("/", &Variable::number(Decimal::ONE), &Variable::number(Decimal::ZERO))
            .unwrap_err();
        assert!(err.message.contains("zero"));
    }

    #[test]
    fn string_minus_removes_last_occurrence() {
        let got = string_binary("-", "hello world world", "world").unwrap();
        assert_eq!(got, Variable::String("hello world ".into()));
    }

    #[test]
    fn string_minus_without_match_is_unchanged() {
        let got = string_binary("-", "hello", "xyz").unwrap();
        assert_eq!(got, Variable::String("hello".into()));
    }

    #[test]
    fn string_comparison_beyond_eq_errors() {
        let err = string_binary("<", "a", "b").unwrap_err();
        assert!(err.message.contains("not defined"));
    }

    #[test]
    fn not_maps_zero_and_nonzero() {
        assert_eq!(
            run_unary_operation(UnaryOp::Not, &Variable::number(Decimal::ZERO)).unwrap(),
            Variable::Number(Decimal::ONE)
        );
        assert_eq!(
            run_unary_operation(UnaryOp::Not, &Variable::number(Decimal::from(5))).unwrap(),
            Variable::Number(Decimal::ZERO)
        );
    }

    #[test]
    fn increment_on_string_appends_space() {
        let got = run_increment("++", &Variable::string("hi")).unwrap();
        assert_eq!(got, Variable::String("hi ".into()));
    }

    #[test]
    fn decrement_on_empty_string_errors() {
        let err = run_increment("--", &Variable::string("")).unwrap_err();
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn builtin_results_are_truncated() {
        // sqrt(2) = 1.41421356..., truncated to 1.414
        let got = run_builtin("sqrt", &Variable::number(Decimal::from(2))).unwrap();
        assert_eq!(got, Variable::Number(Decimal::new(1414, 3)));
    }

    #[test]
    fn builtin_rejects_string_argument() {
        let err = run_builtin("abs", &Variable::string("x")).unwrap_err();
        assert!(err.message.contains("expects a number"));
    }
}
