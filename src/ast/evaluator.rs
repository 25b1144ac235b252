use crate::ast::operators::{eval_binary, eval_unary};
use crate::ast::{ASTNode, EvalError, Number, Stack, Value, Vars};
use crate::functions::Functions;
use log::{debug, trace};
use std::sync::Arc;

/// A parsed rule paired with the state of the functions it calls.
///
/// Function state carries over from one evaluation to the next, so a single
/// instance should only ever see one ordered stream of data points. Streams
/// evaluated side by side each get their own instance; the tree itself is
/// shared through an `Arc`.
#[derive(Debug)]
pub struct StatefulExpr {
    node: Arc<ASTNode>,
    functions: Functions,
}

impl StatefulExpr {
    /// Creates an expression with fresh instances of the built-in functions.
    pub fn new(node: impl Into<Arc<ASTNode>>) -> Self {
        Self::with_functions(node, Functions::builtin())
    }

    /// Creates an expression over a caller-assembled registry.
    pub fn with_functions(node: impl Into<Arc<ASTNode>>, functions: Functions) -> Self {
        Self {
            node: node.into(),
            functions,
        }
    }

    pub fn node(&self) -> &Arc<ASTNode> {
        &self.node
    }

    /// Resets the state of every function, for reuse on an unrelated stream.
    pub fn reset(&mut self) {
        debug!("Resetting {} functions", self.functions.len());
        self.functions.reset();
    }

    /// Evaluates the expression, expecting a `Bool` result.
    pub fn eval_bool(&mut self, vars: &Vars) -> Result<bool, EvalError> {
        match self.eval_result(vars)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::WrongResultType(other.kind())),
        }
    }

    /// Evaluates the expression, expecting a `Float` result.
    ///
    /// An `Int` result is rejected; wrap the rule in `float()` instead.
    pub fn eval_num(&mut self, vars: &Vars) -> Result<f64, EvalError> {
        match self.eval_result(vars)? {
            Value::Float(n) => Ok(n),
            other => Err(EvalError::WrongResultType(other.kind())),
        }
    }

    /// Keeps the data points for which the expression evaluates to `true`.
    ///
    /// Points are evaluated in order; the first error aborts the whole batch.
    pub fn filter<I>(&mut self, points: I) -> Result<Vec<Vars>, EvalError>
    where
        I: IntoIterator<Item = Vars>,
    {
        let mut kept = Vec::new();
        for point in points {
            if self.eval_bool(&point)? {
                kept.push(point);
            }
        }
        Ok(kept)
    }

    fn eval_result(&mut self, vars: &Vars) -> Result<Value, EvalError> {
        let mut stack = Stack::new();
        let node = Arc::clone(&self.node);
        self.eval(&node, vars, &mut stack)?;
        let value = single_value(&mut stack)?;
        resolve(value, vars)
    }

    fn eval(&mut self, node: &ASTNode, vars: &Vars, stack: &mut Stack) -> Result<(), EvalError> {
        match node {
            ASTNode::Empty => {}
            ASTNode::Boolean(b) => stack.push(Value::Bool(*b)),
            ASTNode::Number(Number::Int(n)) => stack.push(Value::Int(*n)),
            ASTNode::Number(Number::Float(n)) => stack.push(Value::Float(*n)),
            ASTNode::Duration(d) => stack.push(Value::Duration(*d)),
            ASTNode::StringLiteral(s) => stack.push(Value::String(s.clone())),
            ASTNode::Regex(pattern) => stack.push(Value::Regex(pattern.clone())),
            ASTNode::Identifier(name) => stack.push(Value::UnresolvedRef(name.clone())),
            ASTNode::UnaryOperation { operator, operand } => {
                self.eval_operand(operand, vars, stack)?;
                let value = pop(stack, vars)?;
                stack.push(eval_unary(*operator, value)?);
            }
            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => {
                self.eval_operand(left, vars, stack)?;
                self.eval_operand(right, vars, stack)?;
                let r = stack.pop().ok_or(EvalError::InvalidExpression)?;
                let l = stack.pop().ok_or(EvalError::InvalidExpression)?;
                // Left first, so a missing name is reported in source order.
                let l = resolve(l, vars)?;
                let r = resolve(r, vars)?;
                stack.push(eval_binary(*operator, l, r)?);
            }
            ASTNode::FunctionCall { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    self.eval_operand(arg, vars, stack)?;
                    values.push(pop(stack, vars)?);
                }

                let function = self
                    .functions
                    .get_mut(name)
                    .ok_or_else(|| EvalError::UndefinedFunction(name.clone()))?;
                let result = function.call(&values).map_err(|source| {
                    debug!("Function {} failed on {:?}: {}", name, values, source);
                    EvalError::FunctionCall {
                        name: name.clone(),
                        source,
                    }
                })?;
                stack.push(result);
            }
        }
        Ok(())
    }

    /// Walks a child node, which must leave exactly one new value behind.
    fn eval_operand(
        &mut self,
        node: &ASTNode,
        vars: &Vars,
        stack: &mut Stack,
    ) -> Result<(), EvalError> {
        let depth = stack.len();
        self.eval(node, vars, stack)?;
        if stack.len() != depth + 1 {
            return Err(EvalError::InvalidExpression);
        }
        Ok(())
    }
}

/// Pops an operand and resolves it if it is a variable reference.
fn pop(stack: &mut Stack, vars: &Vars) -> Result<Value, EvalError> {
    let value = stack.pop().ok_or(EvalError::InvalidExpression)?;
    resolve(value, vars)
}

fn resolve(value: Value, vars: &Vars) -> Result<Value, EvalError> {
    match value {
        Value::UnresolvedRef(name) => {
            trace!("Resolving variable {}", name);
            vars.get(&name)
                .cloned()
                .ok_or(EvalError::UndefinedVariable(name))
        }
        other => Ok(other),
    }
}

fn single_value(stack: &mut Stack) -> Result<Value, EvalError> {
    if stack.len() != 1 {
        return Err(EvalError::InvalidExpression);
    }
    stack.pop().ok_or(EvalError::InvalidExpression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, Pattern, UnaryOperator};
    use crate::functions::{Function, FunctionError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn vars(pairs: &[(&str, Value)]) -> Vars {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn eval_bool(node: ASTNode, vars: &Vars) -> Result<bool, EvalError> {
        StatefulExpr::new(node).eval_bool(vars)
    }

    /// Returns its last argument.
    struct Last;

    impl Function for Last {
        fn call(&mut self, args: &[Value]) -> Result<Value, FunctionError> {
            args.last()
                .cloned()
                .ok_or_else(|| FunctionError::Failed("no arguments".to_string()))
        }

        fn reset(&mut self) {}
    }

    struct Boom;

    impl Function for Boom {
        fn call(&mut self, _args: &[Value]) -> Result<Value, FunctionError> {
            Err(FunctionError::Failed("boom".to_string()))
        }

        fn reset(&mut self) {}
    }

    struct ResetProbe(Arc<AtomicUsize>);

    impl Function for ResetProbe {
        fn call(&mut self, _args: &[Value]) -> Result<Value, FunctionError> {
            Ok(Value::Bool(true))
        }

        fn reset(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_literal_results() {
        let empty = Vars::new();
        assert_eq!(eval_bool(ASTNode::Boolean(true), &empty), Ok(true));
        assert_eq!(StatefulExpr::new(ASTNode::float(2.5)).eval_num(&empty), Ok(2.5));
    }

    #[test]
    fn test_int_result_rejected_by_eval_num() {
        let mut expr = StatefulExpr::new(ASTNode::int(3));
        assert_eq!(
            expr.eval_num(&Vars::new()),
            Err(EvalError::WrongResultType("int"))
        );
    }

    #[test]
    fn test_wrong_result_type() {
        let mut expr = StatefulExpr::new(ASTNode::string("up"));
        assert_eq!(
            expr.eval_bool(&Vars::new()),
            Err(EvalError::WrongResultType("string"))
        );
        let mut expr = StatefulExpr::new(ASTNode::Duration(Duration::from_secs(1)));
        let err = expr.eval_num(&Vars::new()).unwrap_err();
        assert_eq!(err.to_string(), "expression returned unexpected type duration");
    }

    #[test]
    fn test_arithmetic_with_variables() {
        // (price - 100.0) * 2.0
        let node = ASTNode::binary(
            ASTNode::binary(
                ASTNode::identifier("price"),
                BinaryOperator::Subtract,
                ASTNode::float(100.0),
            ),
            BinaryOperator::Multiply,
            ASTNode::float(2.0),
        );
        let mut expr = StatefulExpr::new(node);
        assert_eq!(expr.eval_num(&vars(&[("price", Value::Float(120.0))])), Ok(40.0));
        assert_eq!(expr.eval_num(&vars(&[("price", Value::Float(99.5))])), Ok(-1.0));
    }

    #[test]
    fn test_mixed_math_is_type_mismatch() {
        let node = ASTNode::binary(
            ASTNode::identifier("n"),
            BinaryOperator::Add,
            ASTNode::float(1.0),
        );
        let mut expr = StatefulExpr::new(node);
        assert_eq!(
            expr.eval_num(&vars(&[("n", Value::Int(1))])),
            Err(EvalError::MismatchedTypes)
        );
    }

    #[test]
    fn test_comparison_promotes_int() {
        let empty = Vars::new();
        let less = ASTNode::binary(ASTNode::int(1), BinaryOperator::LessThan, ASTNode::float(1.5));
        let greater = ASTNode::binary(
            ASTNode::int(2),
            BinaryOperator::GreaterThan,
            ASTNode::float(1.9),
        );
        assert_eq!(eval_bool(less, &empty), Ok(true));
        assert_eq!(eval_bool(greater, &empty), Ok(true));
    }

    #[test]
    fn test_regex_rule() {
        let pattern = Pattern::new("^abc").unwrap();
        let node = ASTNode::binary(
            ASTNode::identifier("host"),
            BinaryOperator::RegexMatch,
            ASTNode::Regex(pattern.clone()),
        );
        let mut expr = StatefulExpr::new(node);
        assert_eq!(expr.eval_bool(&vars(&[("host", Value::from("abcdef"))])), Ok(true));
        assert_eq!(expr.eval_bool(&vars(&[("host", Value::from("xyz"))])), Ok(false));

        let negated = ASTNode::binary(
            ASTNode::identifier("host"),
            BinaryOperator::RegexNotMatch,
            ASTNode::Regex(pattern),
        );
        let mut expr = StatefulExpr::new(negated);
        assert_eq!(expr.eval_bool(&vars(&[("host", Value::from("abcdef"))])), Ok(false));
        assert_eq!(expr.eval_bool(&vars(&[("host", Value::from("xyz"))])), Ok(true));
    }

    #[test]
    fn test_reference_resolved_per_evaluation() {
        let mut expr = StatefulExpr::new(ASTNode::identifier("alert"));
        assert_eq!(expr.eval_bool(&vars(&[("alert", Value::Bool(true))])), Ok(true));
        assert_eq!(expr.eval_bool(&vars(&[("alert", Value::Bool(false))])), Ok(false));
        assert_eq!(
            expr.eval_bool(&Vars::new()),
            Err(EvalError::UndefinedVariable("alert".to_string()))
        );
    }

    #[test]
    fn test_undefined_operand_variable() {
        let node = ASTNode::binary(
            ASTNode::identifier("x"),
            BinaryOperator::GreaterThan,
            ASTNode::int(1),
        );
        assert_eq!(
            eval_bool(node, &Vars::new()),
            Err(EvalError::UndefinedVariable("x".to_string()))
        );
    }

    #[test]
    fn test_undefined_operands_reported_left_first() {
        let node = ASTNode::binary(
            ASTNode::identifier("a"),
            BinaryOperator::Add,
            ASTNode::identifier("b"),
        );
        let mut expr = StatefulExpr::new(node);
        assert_eq!(
            expr.eval_num(&Vars::new()),
            Err(EvalError::UndefinedVariable("a".to_string()))
        );
        assert_eq!(
            expr.eval_num(&vars(&[("a", Value::Float(1.0))])),
            Err(EvalError::UndefinedVariable("b".to_string()))
        );
    }

    #[test]
    fn test_unary_on_reference() {
        let not_up = ASTNode::unary(UnaryOperator::Not, ASTNode::identifier("up"));
        let mut expr = StatefulExpr::new(not_up);
        assert_eq!(expr.eval_bool(&vars(&[("up", Value::Bool(false))])), Ok(true));

        let negated = ASTNode::unary(UnaryOperator::Negate, ASTNode::identifier("v"));
        let mut expr = StatefulExpr::new(negated);
        assert_eq!(expr.eval_num(&vars(&[("v", Value::Float(3.0))])), Ok(-3.0));
        assert_eq!(
            expr.eval_num(&vars(&[("v", Value::Bool(true))])),
            Err(EvalError::InvalidUnaryOperand {
                operator: UnaryOperator::Negate,
                value: Value::Bool(true)
            })
        );
    }

    #[test]
    fn test_count_across_evaluations_and_reset() {
        let node = ASTNode::call("float", vec![ASTNode::call("count", vec![])]);
        let mut expr = StatefulExpr::new(node);
        let empty = Vars::new();
        assert_eq!(expr.eval_num(&empty), Ok(1.0));
        assert_eq!(expr.eval_num(&empty), Ok(2.0));
        assert_eq!(expr.eval_num(&empty), Ok(3.0));
        expr.reset();
        assert_eq!(expr.eval_num(&empty), Ok(1.0));
    }

    #[test]
    fn test_instances_sharing_a_tree_keep_separate_state() {
        let node = Arc::new(ASTNode::call("float", vec![ASTNode::call("count", vec![])]));
        let mut first = StatefulExpr::new(Arc::clone(&node));
        let mut second = StatefulExpr::new(Arc::clone(&node));
        let empty = Vars::new();
        assert_eq!(first.eval_num(&empty), Ok(1.0));
        assert_eq!(first.eval_num(&empty), Ok(2.0));
        assert_eq!(second.eval_num(&empty), Ok(1.0));
        assert!(Arc::ptr_eq(first.node(), second.node()));
    }

    #[test]
    fn test_reset_only_when_asked() {
        let resets = Arc::new(AtomicUsize::new(0));
        let mut functions = Functions::new();
        functions.register("probe", ResetProbe(Arc::clone(&resets)));
        let mut expr = StatefulExpr::with_functions(ASTNode::call("probe", vec![]), functions);

        let empty = Vars::new();
        expr.eval_bool(&empty).unwrap();
        expr.eval_bool(&empty).unwrap();
        assert_eq!(resets.load(Ordering::SeqCst), 0);

        expr.reset();
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_function_arguments_resolved_in_order() {
        let mut functions = Functions::new();
        functions.register("last", Last);
        let node = ASTNode::call("last", vec![ASTNode::identifier("a"), ASTNode::identifier("b")]);
        let mut expr = StatefulExpr::with_functions(node, functions);
        let point = vars(&[("a", Value::Float(1.0)), ("b", Value::Float(2.0))]);
        assert_eq!(expr.eval_num(&point), Ok(2.0));
    }

    #[test]
    fn test_undefined_argument_aborts_before_later_arguments() {
        let mut functions = Functions::builtin();
        functions.register("last", Last);
        let node = ASTNode::call(
            "last",
            vec![ASTNode::identifier("missing"), ASTNode::call("count", vec![])],
        );
        let node = ASTNode::call("float", vec![node]);
        let mut expr = StatefulExpr::with_functions(node, functions);

        assert_eq!(
            expr.eval_num(&Vars::new()),
            Err(EvalError::UndefinedVariable("missing".to_string()))
        );
        // count() was never reached by the failed evaluation
        let point = vars(&[("missing", Value::Int(0))]);
        assert_eq!(expr.eval_num(&point), Ok(1.0));
    }

    #[test]
    fn test_undefined_function() {
        let mut expr = StatefulExpr::new(ASTNode::call("nope", vec![ASTNode::int(1)]));
        assert_eq!(
            expr.eval_bool(&Vars::new()),
            Err(EvalError::UndefinedFunction("nope".to_string()))
        );
    }

    #[test]
    fn test_function_error_is_wrapped_with_name() {
        let mut functions = Functions::new();
        functions.register("boom", Boom);
        let mut expr = StatefulExpr::with_functions(ASTNode::call("boom", vec![]), functions);
        let err = expr.eval_bool(&Vars::new()).unwrap_err();
        assert_eq!(
            err,
            EvalError::FunctionCall {
                name: "boom".to_string(),
                source: FunctionError::Failed("boom".to_string())
            }
        );
        assert_eq!(err.to_string(), "error calling boom: boom");
    }

    #[test]
    fn test_empty_tree_is_invalid() {
        let mut expr = StatefulExpr::new(ASTNode::Empty);
        assert_eq!(expr.eval_bool(&Vars::new()), Err(EvalError::InvalidExpression));
        assert_eq!(expr.eval_num(&Vars::new()), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_malformed_tree_is_invalid_not_type_error() {
        let empty = Vars::new();
        let node = ASTNode::binary(ASTNode::Empty, BinaryOperator::Add, ASTNode::int(1));
        assert_eq!(eval_bool(node, &empty), Err(EvalError::InvalidExpression));

        let node = ASTNode::unary(UnaryOperator::Not, ASTNode::Empty);
        assert_eq!(eval_bool(node, &empty), Err(EvalError::InvalidExpression));

        let node = ASTNode::binary(
            ASTNode::identifier("x"),
            BinaryOperator::Add,
            ASTNode::call("float", vec![ASTNode::Empty]),
        );
        let point = vars(&[("x", Value::Float(1.0))]);
        assert_eq!(eval_bool(node, &point), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_residual_values_are_invalid() {
        let mut stack = Stack::new();
        assert_eq!(single_value(&mut stack), Err(EvalError::InvalidExpression));
        stack.push(Value::Int(1));
        stack.push(Value::Int(2));
        assert_eq!(single_value(&mut stack), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_integer_division_by_zero() {
        let node = ASTNode::call(
            "float",
            vec![ASTNode::binary(ASTNode::int(1), BinaryOperator::Divide, ASTNode::int(0))],
        );
        let mut expr = StatefulExpr::new(node);
        assert_eq!(expr.eval_num(&Vars::new()), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_filter_points() {
        // sigma(value) > 1.0 AND host =~ /^web/
        let node = ASTNode::binary(
            ASTNode::binary(
                ASTNode::call("sigma", vec![ASTNode::identifier("value")]),
                BinaryOperator::GreaterThan,
                ASTNode::float(1.0),
            ),
            BinaryOperator::And,
            ASTNode::binary(
                ASTNode::identifier("host"),
                BinaryOperator::RegexMatch,
                ASTNode::Regex(Pattern::new("^web").unwrap()),
            ),
        );
        let points: Vec<Vars> = [1.0, 1.0, 1.0, 1.0, 10.0]
            .iter()
            .map(|v| vars(&[("value", Value::Float(*v)), ("host", Value::from("web01"))]))
            .collect();

        let mut expr = StatefulExpr::new(node);
        let kept = expr.filter(points).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["value"], Value::Float(10.0));
    }

    #[test]
    fn test_filter_fails_fast() {
        let mut expr = StatefulExpr::new(ASTNode::identifier("ok"));
        let points = vec![vars(&[("ok", Value::Bool(true))]), Vars::new()];
        assert_eq!(
            expr.filter(points),
            Err(EvalError::UndefinedVariable("ok".to_string()))
        );
    }

    #[test]
    fn test_expression_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<StatefulExpr>();
    }
}
