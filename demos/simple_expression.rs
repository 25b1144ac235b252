use std::collections::HashMap;
use tickeval::ast::BinaryOperator;
use tickeval::{ASTNode, StatefulExpr, Value};

fn main() {
    pretty_env_logger::init();

    // price > 100 AND volume < 5000
    let rule = ASTNode::binary(
        ASTNode::binary(
            ASTNode::identifier("price"),
            BinaryOperator::GreaterThan,
            ASTNode::int(100),
        ),
        BinaryOperator::And,
        ASTNode::binary(
            ASTNode::identifier("volume"),
            BinaryOperator::LessThan,
            ASTNode::int(5000),
        ),
    );

    let contexts = vec![
        HashMap::from([
            ("price".to_string(), Value::Float(120.0)),
            ("volume".to_string(), Value::Int(3000)),
        ]),
        HashMap::from([
            ("price".to_string(), Value::Float(80.0)),
            ("volume".to_string(), Value::Int(6000)),
        ]),
        HashMap::from([
            ("price".to_string(), Value::Float(140.0)),
            ("volume".to_string(), Value::Int(1000)),
            ("muted".to_string(), Value::Bool(true)),
        ]),
        HashMap::from([("price".to_string(), Value::Float(130.0))]),
    ];

    let mut expr = StatefulExpr::new(rule);
    for (i, context) in contexts.iter().enumerate() {
        match expr.eval_bool(context) {
            Ok(result) => {
                let muted = context.get("muted").and_then(Value::as_bool);
                if muted == Some(true) {
                    println!("Result {}: {} (muted)", i, result);
                } else {
                    println!("Result {}: {}", i, result);
                }
            }
            Err(err) => println!("Error {}: {}", i, err),
        }
    }
}
