use std::sync::Arc;
use tickeval::ast::BinaryOperator;
use tickeval::{evaluate_streams, ASTNode, Value, Vars};

fn main() {
    pretty_env_logger::init();

    // cpu > 90.0
    let tree = Arc::new(ASTNode::binary(
        ASTNode::identifier("cpu"),
        BinaryOperator::GreaterThan,
        ASTNode::float(90.0),
    ));

    let streams: Vec<Vec<Vars>> = [[42.0, 95.5, 88.0], [91.0, 99.9, 12.5]]
        .iter()
        .map(|readings| {
            readings
                .iter()
                .map(|cpu| Vars::from([("cpu".to_string(), Value::Float(*cpu))]))
                .collect()
        })
        .collect();

    for (i, result) in evaluate_streams(&tree, &streams).into_iter().enumerate() {
        println!("Stream {}: {:?}", i, result);
    }
}
