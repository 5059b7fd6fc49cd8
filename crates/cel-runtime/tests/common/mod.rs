//! Common test utilities for cel-runtime integration tests.

use cel_runtime::ast::{Expr, ExprBuilder};
use cel_runtime::eval::EvaluationMode;
use cel_runtime::{Activation, Runtime, RuntimeOptions, Value};

/// Plan and evaluate `expr` in both evaluation modes, asserting they agree.
#[allow(dead_code)]
pub fn eval_with(runtime: &Runtime, expr: &Expr, activation: &dyn Activation) -> Value {
    let program = runtime
        .plan(expr)
        .unwrap_or_else(|e| panic!("failed to plan {:?}: {}", expr, e));
    let iterative = program
        .evaluate(activation)
        .unwrap_or_else(|e| panic!("iterative evaluation failed: {}", e));

    let recursive = runtime
        .clone()
        .with_evaluation_mode(EvaluationMode::Recursive)
        .plan(expr)
        .unwrap_or_else(|e| panic!("failed to plan {:?}: {}", expr, e))
        .evaluate(activation)
        .unwrap_or_else(|e| panic!("recursive evaluation failed: {}", e));

    assert_eq!(
        iterative, recursive,
        "iterative and recursive evaluation disagree"
    );
    iterative
}

/// Evaluate with the standard runtime and default options.
#[allow(dead_code)]
pub fn eval(expr: &Expr, activation: &dyn Activation) -> Value {
    let runtime = Runtime::new(RuntimeOptions::default()).expect("builtins register");
    eval_with(&runtime, expr, activation)
}

/// `range.exists(x, x == needle)` in its lowered comprehension form.
#[allow(dead_code)]
pub fn exists_eq(b: &ExprBuilder, range: Expr, needle: Expr) -> Expr {
    let accu = "__result__";
    let condition = b.call(
        "@not_strictly_false",
        vec![b.call("!_", vec![b.ident(accu)])],
    );
    let step = b.call(
        "_||_",
        vec![b.ident(accu), b.call("_==_", vec![b.ident("x"), needle])],
    );
    b.comprehension("x", range, accu, b.bool(false), condition, step, b.ident(accu))
}
