//! Operator semantics. Operands reaching these functions are already resolved.

use crate::ast::{BinaryOperator, EvalError, Pattern, UnaryOperator, Value};

pub(super) fn eval_unary(operator: UnaryOperator, value: Value) -> Result<Value, EvalError> {
    match (operator, value) {
        (UnaryOperator::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOperator::Negate, Value::Float(n)) => Ok(Value::Float(-1.0 * n)),
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (operator, value) => Err(EvalError::InvalidUnaryOperand { operator, value }),
    }
}

pub(super) fn eval_binary(
    operator: BinaryOperator,
    left: Value,
    right: Value,
) -> Result<Value, EvalError> {
    if operator.is_math() {
        return match (left, right) {
            (Value::Int(l), Value::Int(r)) => int_math(operator, l, r).map(Value::Int),
            (Value::Float(l), Value::Float(r)) => float_math(operator, l, r).map(Value::Float),
            _ => Err(EvalError::MismatchedTypes),
        };
    }

    let result = match (&left, &right) {
        (Value::Bool(l), Value::Bool(r)) => bool_comp(operator, *l, *r)?,
        (Value::Int(_) | Value::Float(_), _) => {
            let l = promote(&left).ok_or(EvalError::MismatchedTypes)?;
            let r = promote(&right).ok_or(EvalError::MismatchedTypes)?;
            float_comp(operator, l, r)?
        }
        (Value::String(l), Value::String(r)) => string_comp(operator, l, r)?,
        (Value::String(l), Value::Regex(r)) => regex_comp(operator, l, r)?,
        _ => return Err(EvalError::MismatchedTypes),
    };
    Ok(Value::Bool(result))
}

/// The only implicit conversion: numbers compare as floats.
fn promote(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

/// Truncating division, wrapping on overflow.
fn int_math(operator: BinaryOperator, l: i64, r: i64) -> Result<i64, EvalError> {
    match operator {
        BinaryOperator::Add => Ok(l.wrapping_add(r)),
        BinaryOperator::Subtract => Ok(l.wrapping_sub(r)),
        BinaryOperator::Multiply => Ok(l.wrapping_mul(r)),
        BinaryOperator::Divide => {
            if r == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(l.wrapping_div(r))
            }
        }
        _ => Err(EvalError::InvalidOperator {
            operator,
            kind: "integer math",
        }),
    }
}

fn float_math(operator: BinaryOperator, l: f64, r: f64) -> Result<f64, EvalError> {
    match operator {
        BinaryOperator::Add => Ok(l + r),
        BinaryOperator::Subtract => Ok(l - r),
        BinaryOperator::Multiply => Ok(l * r),
        BinaryOperator::Divide => Ok(l / r),
        _ => Err(EvalError::InvalidOperator {
            operator,
            kind: "float math",
        }),
    }
}

fn bool_comp(operator: BinaryOperator, l: bool, r: bool) -> Result<bool, EvalError> {
    match operator {
        BinaryOperator::Equal => Ok(l == r),
        BinaryOperator::NotEqual => Ok(l != r),
        BinaryOperator::And => Ok(l && r),
        BinaryOperator::Or => Ok(l || r),
        _ => Err(EvalError::InvalidOperator {
            operator,
            kind: "boolean comparison",
        }),
    }
}

fn float_comp(operator: BinaryOperator, l: f64, r: f64) -> Result<bool, EvalError> {
    match operator {
        BinaryOperator::Equal => Ok(l == r),
        BinaryOperator::NotEqual => Ok(l != r),
        BinaryOperator::LessThan => Ok(l < r),
        BinaryOperator::GreaterThan => Ok(l > r),
        BinaryOperator::LessThanOrEqual => Ok(l <= r),
        BinaryOperator::GreaterThanOrEqual => Ok(l >= r),
        _ => Err(EvalError::InvalidOperator {
            operator,
            kind: "float comparison",
        }),
    }
}

fn string_comp(operator: BinaryOperator, l: &str, r: &str) -> Result<bool, EvalError> {
    match operator {
        BinaryOperator::Equal => Ok(l == r),
        BinaryOperator::NotEqual => Ok(l != r),
        BinaryOperator::LessThan => Ok(l < r),
        BinaryOperator::GreaterThan => Ok(l > r),
        BinaryOperator::LessThanOrEqual => Ok(l <= r),
        BinaryOperator::GreaterThanOrEqual => Ok(l >= r),
        _ => Err(EvalError::InvalidOperator {
            operator,
            kind: "string comparison",
        }),
    }
}

fn regex_comp(operator: BinaryOperator, l: &str, r: &Pattern) -> Result<bool, EvalError> {
    match operator {
        BinaryOperator::RegexMatch => Ok(r.is_match(l)),
        BinaryOperator::RegexNotMatch => Ok(!r.is_match(l)),
        _ => Err(EvalError::MismatchedTypes),
    }
}
