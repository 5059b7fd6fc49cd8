//! CEL evaluation engine.
//!
//! This module provides the runtime side of CEL:
//!
//! - `Value` represents runtime values, including the `Error` and `Unknown`
//!   signals that flow through evaluation like ordinary values
//! - `FunctionRegistry` holds function overloads, `Resolver` finds them by
//!   namespace-qualified name
//! - `Activation` provides variable bindings, lazily bound functions, and
//!   unknown/missing attribute patterns
//! - `ExecutionPath` is the flat step list run by the iterative `Evaluator`;
//!   `DirectEvaluator` walks the planned tree recursively instead
//! - `Program` wraps a planned expression and dispatches to either evaluator
//!
//! # Example
//!
//! ```
//! use cel_runtime::ast::ExprBuilder;
//! use cel_runtime::eval::{MapActivation, RuntimeOptions, Value};
//! use cel_runtime::Runtime;
//!
//! let runtime = Runtime::new(RuntimeOptions::default()).unwrap();
//!
//! let b = ExprBuilder::new();
//! let expr = b.call("_+_", vec![b.ident("x"), b.int(1)]);
//! let program = runtime.plan(&expr).unwrap();
//!
//! let activation = MapActivation::new().with_binding("x", 41);
//! assert_eq!(program.evaluate(&activation).unwrap(), Value::Int(42));
//! ```

mod activation;
mod builtins;
mod direct;
mod error;
mod evaluator;
mod frame;
mod functions;
mod options;
mod path;
mod plan;
mod program;
mod provider;
mod resolver;
mod time;
mod unknown;
mod value;

pub use activation::{Activation, EmptyActivation, MapActivation};
pub use builtins::register_builtins;
pub use direct::DirectEvaluator;
pub use error::{Code, EvalError, ExecError, PlanError, ProviderError, RegistryError};
pub use evaluator::Evaluator;
pub use functions::{
    call_signature, Function, FunctionDescriptor, FunctionImpl, FunctionRegistry,
    IntoFunctionImpl, Overload,
};
pub use options::{EvaluationMode, RuntimeOptions, UnknownProcessing};
pub use path::{ExecutionPath, Step};
pub use plan::{CallTarget, LogicOp, PlanKind, PlanNode, PlannedComprehension};
pub use program::Program;
pub use provider::{Record, StaticTypeProvider, TypeDescriptor, TypeDescriptorKind, TypeProvider};
pub use resolver::Resolver;
pub use unknown::{
    Attribute, AttributePattern, FunctionResult, MatchType, Qualifier, QualifierPattern,
    UnknownSet,
};
pub use value::{Duration, Kind, MapKey, StructValue, Timestamp, TypeValue, Value, ValueMap};
