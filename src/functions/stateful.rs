//! Streaming aggregates. Each instance accumulates over the data points a
//! single `StatefulExpr` sees, until it is reset.

use crate::ast::Value;
use crate::functions::{expect_arity, float_arg, Function, FunctionError, Functions};
use log::trace;

pub fn register(functions: &mut Functions) {
    functions.register("count", Count::default());
    functions.register("sigma", Sigma::default());
    functions.register("spread", Spread::default());
}

/// `count()`: number of times it has been called.
#[derive(Debug, Default, Clone)]
pub struct Count {
    count: i64,
}

impl Function for Count {
    fn call(&mut self, args: &[Value]) -> Result<Value, FunctionError> {
        expect_arity(args, 0)?;
        self.count += 1;
        Ok(Value::Int(self.count))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// `sigma(x)`: how many standard deviations `x` lies from the running mean.
///
/// Mean and variance are updated with `x` before the distance is taken
/// (Welford's method, population variance). Returns `0.0` while the
/// deviation is zero.
#[derive(Debug, Default, Clone)]
pub struct Sigma {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Function for Sigma {
    fn call(&mut self, args: &[Value]) -> Result<Value, FunctionError> {
        expect_arity(args, 1)?;
        let x = float_arg(args, 0)?;

        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);

        let stddev = (self.m2 / self.n as f64).sqrt();
        trace!("sigma: n={} mean={} stddev={}", self.n, self.mean, stddev);
        if stddev == 0.0 {
            return Ok(Value::Float(0.0));
        }
        Ok(Value::Float((x - self.mean).abs() / stddev))
    }

    fn reset(&mut self) {
        *self = Sigma::default();
    }
}

/// `spread(x)`: running maximum minus running minimum.
#[derive(Debug, Default, Clone)]
pub struct Spread {
    bounds: Option<(f64, f64)>,
}

impl Function for Spread {
    fn call(&mut self, args: &[Value]) -> Result<Value, FunctionError> {
        expect_arity(args, 1)?;
        let x = float_arg(args, 0)?;

        let (min, max) = match self.bounds {
            Some((min, max)) => (min.min(x), max.max(x)),
            None => (x, x),
        };
        self.bounds = Some((min, max));
        Ok(Value::Float(max - min))
    }

    fn reset(&mut self) {
        self.bounds = None;
    }
}
