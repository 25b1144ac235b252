use tickeval::ast::BinaryOperator;
use tickeval::{ASTNode, StatefulExpr, Value, Vars};

fn main() {
    pretty_env_logger::init();

    // sigma(latency) > 2.0
    let rule = ASTNode::binary(
        ASTNode::call("sigma", vec![ASTNode::identifier("latency")]),
        BinaryOperator::GreaterThan,
        ASTNode::float(2.0),
    );
    let mut expr = StatefulExpr::new(rule);

    let latencies = [12.0, 11.5, 12.4, 11.9, 12.1, 48.0, 12.2];
    let points: Vec<Vars> = latencies
        .iter()
        .map(|l| Vars::from([("latency".to_string(), Value::Float(*l))]))
        .collect();

    match expr.filter(points.clone()) {
        Ok(anomalies) => println!("Anomalies: {:?}", anomalies),
        Err(err) => println!("Error: {}", err),
    }

    // A new, unrelated stream starts from scratch.
    expr.reset();
    match expr.filter(points) {
        Ok(anomalies) => println!("Anomalies after reset: {}", anomalies.len()),
        Err(err) => println!("Error: {}", err),
    }
}
