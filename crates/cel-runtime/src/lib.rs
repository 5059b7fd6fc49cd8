//! cel-runtime: evaluation core for the Common Expression Language
//!
//! This crate plans macro-expanded CEL expression trees into programs and
//! evaluates them against variable bindings.
//!
//! # Quick Start
//!
//! ```
//! use cel_runtime::ast::ExprBuilder;
//! use cel_runtime::{MapActivation, Runtime, RuntimeOptions, Value};
//!
//! let runtime = Runtime::new(RuntimeOptions::default()).unwrap();
//!
//! // x > 3 && x < 10
//! let b = ExprBuilder::new();
//! let expr = b.call(
//!     "_&&_",
//!     vec![
//!         b.call("_>_", vec![b.ident("x"), b.int(3)]),
//!         b.call("_<_", vec![b.ident("x"), b.int(10)]),
//!     ],
//! );
//! let program = runtime.plan(&expr).unwrap();
//!
//! let activation = MapActivation::new().with_binding("x", 5);
//! assert_eq!(program.evaluate(&activation).unwrap(), Value::Bool(true));
//! ```
//!
//! # Architecture
//!
//! - **Registry**: function overloads keyed by name, call style, and
//!   argument kinds, with strict and non-strict overloads
//! - **Resolver**: container-relative lookup of functions, enum constants,
//!   and type names
//! - **Planner**: binds every call site to its candidate overloads
//! - **Evaluators**: an iterative one over a flat execution path and a
//!   depth-bounded recursive one over the plan tree
//!
//! Errors and unknowns are ordinary values. Only malformed programs and
//! exhausted recursion depth abort an evaluation.

pub mod ast;
pub mod eval;
mod planner;
mod runtime;

pub use runtime::Runtime;

pub use eval::{
    Activation, AttributePattern, Code, EmptyActivation, EvalError, EvaluationMode, ExecError,
    FunctionDescriptor, FunctionRegistry, Kind, MapActivation, PlanError, Program, RegistryError,
    RuntimeOptions, UnknownProcessing, UnknownSet, Value,
};
