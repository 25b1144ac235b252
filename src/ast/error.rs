use crate::ast::{BinaryOperator, UnaryOperator, Value};
use crate::functions::FunctionError;
use thiserror::Error;

/// Errors raised while evaluating a `StatefulExpr`.
///
/// Evaluation is fail-fast: the first error aborts the walk.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// The walk did not leave exactly one value on the stack.
    #[error("expression is invalid, could not evaluate")]
    InvalidExpression,

    #[error("operands of binary operators must be of the same type, use bool(), int() and float() as needed")]
    MismatchedTypes,

    /// The operand kinds are compatible but the operator is not defined for them.
    #[error("invalid {kind} operator {operator}")]
    InvalidOperator {
        operator: BinaryOperator,
        kind: &'static str,
    },

    #[error("invalid argument to '{operator}' {value}")]
    InvalidUnaryOperand {
        operator: UnaryOperator,
        value: Value,
    },

    #[error("integer division by zero")]
    DivisionByZero,

    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("undefined function {0}")]
    UndefinedFunction(String),

    #[error("error calling {name}: {source}")]
    FunctionCall {
        name: String,
        #[source]
        source: FunctionError,
    },

    #[error("expression returned unexpected type {0}")]
    WrongResultType(&'static str),
}
