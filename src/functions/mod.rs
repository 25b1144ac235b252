pub mod conversion;
pub mod math;
pub mod stateful;

use crate::ast::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A callable available to function-call nodes.
///
/// Implementations may keep state between calls; that state belongs to a
/// single `StatefulExpr` and survives across its evaluations until `reset`.
pub trait Function: Send {
    /// Invoke with arguments already resolved against the evaluation's `Vars`.
    fn call(&mut self, args: &[Value]) -> Result<Value, FunctionError>;

    /// Restore the state the function had right after construction.
    fn reset(&mut self);
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FunctionError {
    #[error("expected {expected} arguments, got {got}")]
    WrongArgCount { expected: usize, got: usize },

    #[error("argument {position} must be {expected}, got {got}")]
    InvalidArgument {
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: &'static str },

    #[error("{0}")]
    Failed(String),
}

/// Checks the argument count of a call.
pub fn expect_arity(args: &[Value], expected: usize) -> Result<(), FunctionError> {
    if args.len() != expected {
        return Err(FunctionError::WrongArgCount {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Retrieves a `Float` argument by position.
pub fn float_arg(args: &[Value], position: usize) -> Result<f64, FunctionError> {
    match args.get(position) {
        Some(Value::Float(n)) => Ok(*n),
        Some(other) => Err(FunctionError::InvalidArgument {
            position,
            expected: "float",
            got: other.kind(),
        }),
        None => Err(FunctionError::WrongArgCount {
            expected: position + 1,
            got: args.len(),
        }),
    }
}

/// Function registry owned by one `StatefulExpr`.
#[derive(Default)]
pub struct Functions {
    functions: HashMap<String, Box<dyn Function>>,
}

impl Functions {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// A registry holding fresh instances of every built-in function.
    pub fn builtin() -> Self {
        let mut functions = Self::new();
        register_functions(&mut functions);
        functions
    }

    /// Registers a function, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Function + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(function));
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Function + 'static)> {
        self.functions.get_mut(name).map(|function| function.as_mut())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resets every registered function.
    pub fn reset(&mut self) {
        for function in self.functions.values_mut() {
            function.reset();
        }
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Functions").field("names", &names).finish()
    }
}

pub fn register_functions(functions: &mut Functions) {
    conversion::register(functions);
    math::register(functions);
    stateful::register(functions);
}
