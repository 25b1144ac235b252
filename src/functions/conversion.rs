//! Explicit conversions. Operators never coerce (apart from int to float in
//! comparisons), so rules call these to line operand kinds up.

use crate::ast::Value;
use crate::functions::{Function, FunctionError, Functions};
use tickeval_macros::tick_fn;

pub fn register(functions: &mut Functions) {
    functions.register("bool", BoolConversion);
    functions.register("int", IntConversion);
    functions.register("float", FloatConversion);
    functions.register("string", StringConversion);
}

fn conversion_error(value: &Value, target: &'static str) -> FunctionError {
    FunctionError::Conversion {
        value: value.to_string(),
        target,
    }
}

#[tick_fn(BoolConversion)]
pub fn bool(value: Value) -> Result<Value, FunctionError> {
    match &value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(n) => Ok(Value::Bool(*n != 0)),
        Value::Float(n) => Ok(Value::Bool(*n != 0.0)),
        Value::String(s) => s
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| conversion_error(&value, "bool")),
        _ => Err(conversion_error(&value, "bool")),
    }
}

#[tick_fn(IntConversion)]
pub fn int(value: Value) -> Result<Value, FunctionError> {
    match &value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => {
            // [-2^63, 2^63); NaN and infinities fall outside.
            let bound = -(i64::MIN as f64);
            let n = n.trunc();
            if (-bound..bound).contains(&n) {
                Ok(Value::Int(n as i64))
            } else {
                Err(conversion_error(&value, "int"))
            }
        }
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Duration(d) => i64::try_from(d.as_nanos())
            .map(Value::Int)
            .map_err(|_| conversion_error(&value, "int")),
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| conversion_error(&value, "int")),
        _ => Err(conversion_error(&value, "int")),
    }
}

#[tick_fn(FloatConversion)]
pub fn float(value: Value) -> Result<Value, FunctionError> {
    match &value {
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| conversion_error(&value, "float")),
        _ => Err(conversion_error(&value, "float")),
    }
}

#[tick_fn(StringConversion)]
pub fn string(value: Value) -> Result<Value, FunctionError> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Int(n) => Ok(Value::String(n.to_string())),
        Value::Float(n) => Ok(Value::String(n.to_string())),
        Value::Duration(d) => Ok(Value::String(format!("{:?}", d))),
        Value::Regex(p) => Ok(Value::String(p.as_str().to_string())),
        other @ Value::UnresolvedRef(_) => Err(conversion_error(&other, "string")),
    }
}
