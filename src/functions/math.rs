use crate::ast::Value;
use crate::functions::{Function, FunctionError, Functions};
use tickeval_macros::tick_fn;

pub fn register(functions: &mut Functions) {
    functions.register("abs", Abs);
    functions.register("sqrt", Sqrt);
    functions.register("pow", Pow);
    functions.register("floor", Floor);
    functions.register("ceil", Ceil);
    functions.register("min", Min);
    functions.register("max", Max);
}

#[tick_fn]
pub fn abs(x: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(x.abs()))
}

#[tick_fn]
pub fn sqrt(x: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(x.sqrt()))
}

#[tick_fn]
pub fn pow(base: f64, exponent: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(base.powf(exponent)))
}

#[tick_fn]
pub fn floor(x: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(x.floor()))
}

#[tick_fn]
pub fn ceil(x: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(x.ceil()))
}

#[tick_fn]
pub fn min(a: f64, b: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(a.min(b)))
}

#[tick_fn]
pub fn max(a: f64, b: f64) -> Result<Value, FunctionError> {
    Ok(Value::Float(a.max(b)))
}
