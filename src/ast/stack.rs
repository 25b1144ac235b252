use crate::ast::Value;

/// Operand stack used during a single tree walk.
///
/// Every node that consumes N values pops exactly N and pushes exactly one.
/// `pop` on an empty stack means the tree was malformed; the evaluator turns
/// that into `EvalError::InvalidExpression`.
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
