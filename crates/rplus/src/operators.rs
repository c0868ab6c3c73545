//! Binary, comparison, and unary operator application.
//!
//! The compiler's operator tables (`binary_opcode` in `compiler.rs`) pick
//! the opcode at compile time; these functions give that opcode runtime
//! meaning once both operands are `Value`s on the stack. Every failure is
//! a typed `Error::Runtime` carrying the faulting instruction's PC, per
//! §4.4's "runtime errors ... include the PC" requirement.

use crate::error::{Error, Result};
use crate::value::Value;

/// `Add`: `Number + Number` is f64 addition, `String + String` concatenates.
/// Any other pairing is a runtime type error — §9's resolved open question.
pub fn add(left: &Value, right: &Value, pc: usize) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => Err(type_error("+", left, right, pc)),
    }
}

/// `Sub`/`Mul`/`Div`/`Mod`: numbers only.
pub fn sub(left: &Value, right: &Value, pc: usize) -> Result<Value> {
    numeric_binop(left, right, pc, "-", |a, b| a - b)
}

pub fn mul(left: &Value, right: &Value, pc: usize) -> Result<Value> {
    numeric_binop(left, right, pc, "*", |a, b| a * b)
}

pub fn div(left: &Value, right: &Value, pc: usize) -> Result<Value> {
    let (a, b) = numeric_pair(left, right, pc, "/")?;
    if b == 0.0 {
        return Err(Error::runtime("Division by zero", pc));
    }
    Ok(Value::Number(a / b))
}

pub fn rem(left: &Value, right: &Value, pc: usize) -> Result<Value> {
    let (a, b) = numeric_pair(left, right, pc, "%")?;
    if b == 0.0 {
        return Err(Error::runtime("Modulo by zero", pc));
    }
    Ok(Value::Number(a % b))
}

pub fn neg(operand: &Value, pc: usize) -> Result<Value> {
    match operand {
        Value::Number(n) => Ok(Value::Number(-n)),
        _ => Err(Error::runtime(
            format!("Unknown unary operator for {}", operand.type_name()),
            pc,
        )),
    }
}

pub fn not(operand: &Value) -> Value {
    Value::Bool(!operand.is_truthy())
}

/// `==`/`!=`: same tag and same component, per §3's equality rule.
/// Cross-tag comparisons are simply not equal rather than an error.
pub fn equal(left: &Value, right: &Value) -> bool {
    left == right
}

/// `< <= > >=`: numbers compare numerically, strings compare
/// lexicographically; any other pairing (including cross-tag) is a
/// runtime type error.
pub fn less(left: &Value, right: &Value, pc: usize) -> Result<bool> {
    compare(left, right, pc, "<", |o| o == std::cmp::Ordering::Less)
}

pub fn less_equal(left: &Value, right: &Value, pc: usize) -> Result<bool> {
    compare(left, right, pc, "<=", |o| o != std::cmp::Ordering::Greater)
}

pub fn greater(left: &Value, right: &Value, pc: usize) -> Result<bool> {
    compare(left, right, pc, ">", |o| o == std::cmp::Ordering::Greater)
}

pub fn greater_equal(left: &Value, right: &Value, pc: usize) -> Result<bool> {
    compare(left, right, pc, ">=", |o| o != std::cmp::Ordering::Less)
}

/// `And`/`Or`: eager, not short-circuiting — both operands are already on
/// the stack by the time the opcode runs, matching the compiler's direct
/// operator-to-opcode mapping (no conditional jump is emitted for them).
pub fn and(left: &Value, right: &Value) -> Value {
    Value::Bool(left.is_truthy() && right.is_truthy())
}

pub fn or(left: &Value, right: &Value) -> Value {
    Value::Bool(left.is_truthy() || right.is_truthy())
}

fn numeric_pair(left: &Value, right: &Value, pc: usize, op: &str) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(type_error(op, left, right, pc)),
    }
}

fn numeric_binop(
    left: &Value,
    right: &Value,
    pc: usize,
    op: &str,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    let (a, b) = numeric_pair(left, right, pc, op)?;
    Ok(Value::Number(f(a, b)))
}

fn compare(
    left: &Value,
    right: &Value,
    pc: usize,
    op: &str,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<bool> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .partial_cmp(b)
            .map(&f)
            .ok_or_else(|| Error::runtime("Comparison with NaN", pc)),
        (Value::String(a), Value::String(b)) => Ok(f(a.cmp(b))),
        _ => Err(type_error(op, left, right, pc)),
    }
}

fn type_error(op: &str, left: &Value, right: &Value, pc: usize) -> Error {
    Error::runtime(
        format!(
            "Unknown binary operator {} for {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
        pc,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_numbers() {
        assert_eq!(
            add(&Value::Number(1.0), &Value::Number(2.0), 0).unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn add_strings_concatenates() {
        assert_eq!(
            add(
                &Value::String("ab\n".into()),
                &Value::String("c".into()),
                0
            )
            .unwrap(),
            Value::String("ab\nc".into())
        );
    }

    #[test]
    fn add_mismatched_types_is_runtime_error() {
        let err = add(&Value::Number(1.0), &Value::String("x".into()), 3).unwrap_err();
        assert!(matches!(err, Error::Runtime { pc: 3, .. }));
    }

    #[test]
    fn div_by_zero_reports_pc() {
        let err = div(&Value::Number(1.0), &Value::Number(0.0), 7).unwrap_err();
        assert_eq!(err, Error::runtime("Division by zero", 7));
    }

    #[test]
    fn ordering_compares_numbers_and_strings() {
        assert!(less(&Value::Number(1.0), &Value::Number(2.0), 0).unwrap());
        assert!(greater_equal(&Value::String("b".into()), &Value::String("a".into()), 0).unwrap());
    }

    #[test]
    fn equal_is_cross_tag_false_not_an_error() {
        assert!(!equal(&Value::Number(0.0), &Value::Bool(false)));
    }
}
