use std::fmt;
use std::time::Duration;

mod error;
mod evaluator;
mod operators;
mod stack;
mod value;

pub use error::EvalError;
pub use evaluator::StatefulExpr;
pub use stack::Stack;
pub use value::{Pattern, Value, Vars};

/// Number literal, keeping the kind the source declared.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Parsed expression tree, as produced by the rule parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    /// Blank source. Evaluates to nothing.
    Empty,
    Boolean(bool),
    Number(Number),
    Duration(Duration),
    StringLiteral(String),
    Regex(Pattern),
    Identifier(String),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOperation {
        left: Box<ASTNode>,
        operator: BinaryOperator,
        right: Box<ASTNode>,
    },
    FunctionCall {
        name: String,
        args: Vec<ASTNode>,
    },
}

impl ASTNode {
    pub fn int(value: i64) -> Self {
        ASTNode::Number(Number::Int(value))
    }

    pub fn float(value: f64) -> Self {
        ASTNode::Number(Number::Float(value))
    }

    pub fn string(value: &str) -> Self {
        ASTNode::StringLiteral(value.to_string())
    }

    pub fn identifier(name: &str) -> Self {
        ASTNode::Identifier(name.to_string())
    }

    pub fn unary(operator: UnaryOperator, operand: ASTNode) -> Self {
        ASTNode::UnaryOperation {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: ASTNode, operator: BinaryOperator, right: ASTNode) -> Self {
        ASTNode::BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn call(name: &str, args: Vec<ASTNode>) -> Self {
        ASTNode::FunctionCall {
            name: name.to_string(),
            args,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

impl TryFrom<&str> for UnaryOperator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "-" => Ok(UnaryOperator::Negate),
            "!" => Ok(UnaryOperator::Not),
            _ => Err(format!("Unknown unary operator: {}", value)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    And,
    Or,
    RegexMatch,
    RegexNotMatch,
}

impl BinaryOperator {
    /// `+ - * /`. Operands must be of the same kind, no promotion.
    pub fn is_math(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    /// Everything that yields a `Bool`, including the logical and regex operators.
    pub fn is_comparison(&self) -> bool {
        !self.is_math()
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::RegexMatch => "=~",
            BinaryOperator::RegexNotMatch => "!~",
        };
        write!(f, "{}", symbol)
    }
}

impl TryFrom<&str> for BinaryOperator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(BinaryOperator::Add),
            "-" => Ok(BinaryOperator::Subtract),
            "*" => Ok(BinaryOperator::Multiply),
            "/" => Ok(BinaryOperator::Divide),
            "==" => Ok(BinaryOperator::Equal),
            "!=" => Ok(BinaryOperator::NotEqual),
            "<" => Ok(BinaryOperator::LessThan),
            ">" => Ok(BinaryOperator::GreaterThan),
            "<=" => Ok(BinaryOperator::LessThanOrEqual),
            ">=" => Ok(BinaryOperator::GreaterThanOrEqual),
            "AND" | "and" | "&&" => Ok(BinaryOperator::And),
            "OR" | "or" | "||" => Ok(BinaryOperator::Or),
            "=~" => Ok(BinaryOperator::RegexMatch),
            "!~" => Ok(BinaryOperator::RegexNotMatch),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}
