pub mod ast;
pub mod functions;

pub use ast::{ASTNode, EvalError, StatefulExpr, Value, Vars};
pub use functions::{Function, FunctionError, Functions};

use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

/// Evaluates independent streams of data points in parallel.
///
/// Each stream gets its own `StatefulExpr` over the shared tree, so function
/// state never leaks between streams. A stream yields its boolean results in
/// order, or the first error it hit.
pub fn evaluate_streams(
    tree: &Arc<ASTNode>,
    streams: &[Vec<Vars>],
) -> Vec<Result<Vec<bool>, EvalError>> {
    evaluate_streams_with(tree, streams, Functions::builtin)
}

/// Like [`evaluate_streams`], building each stream's registry with `functions`.
pub fn evaluate_streams_with<F>(
    tree: &Arc<ASTNode>,
    streams: &[Vec<Vars>],
    functions: F,
) -> Vec<Result<Vec<bool>, EvalError>>
where
    F: Fn() -> Functions + Sync,
{
    debug!("Evaluating {} streams", streams.len());
    streams
        .par_iter()
        .map(|points| {
            let mut expr = StatefulExpr::with_functions(Arc::clone(tree), functions());
            points
                .iter()
                .map(|vars| expr.eval_bool(vars))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}
