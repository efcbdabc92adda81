// SPDX-License-Identifier: Apache-2.0

//! Comparison and math operations over dynamic values.

use crate::ast::{CompOp, MathOp};
use crate::value::Value;
use crate::Result;

/// Evaluate a comparison between two values.
///
/// Nil compared against anything non-nil is unequal rather than an error, so
/// `attributes["missing"] != nil` works as a presence test. Ordering on
/// mixed or unordered types is an error.
#[inline]
pub(crate) fn compare(left: &Value, op: CompOp, right: &Value) -> Result<bool> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(cmp_ord(l, r, op)),
        (Value::Float(l), Value::Float(r)) => Ok(cmp_ord(l, r, op)),
        (Value::Int(l), Value::Float(r)) => Ok(cmp_ord(&(*l as f64), r, op)),
        (Value::Float(l), Value::Int(r)) => Ok(cmp_ord(l, &(*r as f64), op)),
        (Value::String(l), Value::String(r)) => Ok(cmp_ord(l, r, op)),
        (Value::Bool(l), Value::Bool(r)) => cmp_eq_only(l, r, op, "boolean"),
        (Value::Nil, Value::Nil) => cmp_eq_only(&(), &(), op, "nil"),
        (Value::Nil, _) | (_, Value::Nil) => Ok(matches!(op, CompOp::NotEq)),
        (Value::Bytes(l), Value::Bytes(r)) => cmp_eq_only(l, r, op, "bytes"),
        (Value::List(l), Value::List(r)) => cmp_eq_only(l, r, op, "list"),
        (Value::Map(l), Value::Map(r)) => cmp_eq_only(l, r, op, "map"),
        _ => match op {
            CompOp::Eq => Ok(false),
            CompOp::NotEq => Ok(true),
            _ => Err(format!("cannot order values of different types with {:?}", op).into()),
        },
    }
}

#[inline]
fn cmp_ord<T: PartialOrd + PartialEq>(l: &T, r: &T, op: CompOp) -> bool {
    match op {
        CompOp::Eq => l == r,
        CompOp::NotEq => l != r,
        CompOp::Less => l < r,
        CompOp::Greater => l > r,
        CompOp::LessEq => l <= r,
        CompOp::GreaterEq => l >= r,
    }
}

#[inline]
fn cmp_eq_only<T: PartialEq>(l: &T, r: &T, op: CompOp, type_name: &str) -> Result<bool> {
    match op {
        CompOp::Eq => Ok(l == r),
        CompOp::NotEq => Ok(l != r),
        _ => Err(format!("{} comparison only supports == and !=", type_name).into()),
    }
}

/// Evaluate a math operation between two values.
#[inline]
pub(crate) fn math_op(left: &Value, op: MathOp, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => int_op(*l, *r, op),
        (Value::Float(l), Value::Float(r)) => float_op(*l, *r, op),
        (Value::Int(l), Value::Float(r)) => float_op(*l as f64, *r, op),
        (Value::Float(l), Value::Int(r)) => float_op(*l, *r as f64, op),
        (Value::String(l), Value::String(r)) if matches!(op, MathOp::Add) => {
            Ok(Value::string(format!("{}{}", l, r)))
        }
        _ => Err(format!("cannot apply {:?} to {:?} and {:?}", op, left, right).into()),
    }
}

#[inline]
fn int_op(l: i64, r: i64, op: MathOp) -> Result<Value> {
    Ok(Value::Int(match op {
        MathOp::Add => l.wrapping_add(r),
        MathOp::Sub => l.wrapping_sub(r),
        MathOp::Mul => l.wrapping_mul(r),
        MathOp::Div if r == 0 => return Err("division by zero".into()),
        MathOp::Div => l / r,
    }))
}

#[inline]
fn float_op(l: f64, r: f64, op: MathOp) -> Result<Value> {
    Ok(Value::Float(match op {
        MathOp::Add => l + r,
        MathOp::Sub => l - r,
        MathOp::Mul => l * r,
        MathOp::Div if r == 0.0 => return Err("division by zero".into()),
        MathOp::Div => l / r,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_comparisons() {
        assert!(compare(&Value::Nil, CompOp::Eq, &Value::Nil).unwrap());
        assert!(compare(&Value::Nil, CompOp::NotEq, &Value::Int(1)).unwrap());
        assert!(!compare(&Value::Nil, CompOp::Eq, &Value::Int(1)).unwrap());
        // Ordering against nil never holds.
        assert!(!compare(&Value::Nil, CompOp::Less, &Value::Int(1)).unwrap());
    }

    #[test]
    fn numeric_promotion() {
        assert!(compare(&Value::Int(3), CompOp::Less, &Value::Float(3.5)).unwrap());
        assert_eq!(
            math_op(&Value::Int(3), MathOp::Mul, &Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn cross_type_equality() {
        assert!(!compare(&Value::Int(1), CompOp::Eq, &Value::string("1")).unwrap());
        assert!(compare(&Value::Int(1), CompOp::NotEq, &Value::string("1")).unwrap());
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            math_op(&Value::string("a"), MathOp::Add, &Value::string("b")).unwrap(),
            Value::string("ab")
        );
        assert!(math_op(&Value::string("a"), MathOp::Mul, &Value::string("b")).is_err());
    }
}
