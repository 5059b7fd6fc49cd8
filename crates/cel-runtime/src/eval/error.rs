//! Evaluation error types.
//!
//! Two families of failure exist at runtime:
//!
//! - [`EvalError`] is an in-band error. It is carried by `Value::Error`, flows
//!   through the value stack like any other value, and is a valid result of a
//!   successful evaluation.
//! - [`ExecError`] is a fatal, out-of-band failure. It aborts the evaluation
//!   and is returned as the `Err` side of `Program::evaluate`.

use std::fmt;

use thiserror::Error;

/// An error that occurred during CEL evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    /// The status code of the error.
    pub code: Code,
    /// The error message.
    pub message: String,
}

/// Canonical status codes attached to in-band errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Unclassified failure, used for "no matching overload".
    Unknown,
    /// Bad operand, such as division by zero or an unparseable conversion.
    InvalidArgument,
    /// A variable, field, or map key could not be found.
    NotFound,
    /// A registration collided with an existing one.
    AlreadyExists,
    /// Arithmetic overflow or a value outside its representable range.
    OutOfRange,
    /// The operation is not valid for the current state.
    FailedPrecondition,
    /// The operation is not supported.
    Unimplemented,
    /// Internal invariant violated or ambiguous runtime binding.
    Internal,
}

impl Code {
    /// The canonical upper-snake name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EvalError {
    /// Create a new error with the given code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a division by zero error.
    pub fn division_by_zero() -> Self {
        Self::new(Code::InvalidArgument, "divide by zero")
    }

    /// Create a modulo by zero error.
    pub fn modulo_by_zero() -> Self {
        Self::new(Code::InvalidArgument, "modulus by zero")
    }

    /// Create an overflow error.
    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(Code::OutOfRange, message)
    }

    /// Create a no matching overload error for the attempted call signature,
    /// e.g. `_+_(int64, uint64)`.
    pub fn no_matching_overload(signature: &str) -> Self {
        Self::new(
            Code::Unknown,
            format!("No matching overloads found : {}", signature),
        )
    }

    /// Create an error for a variable that is not bound in the activation.
    pub fn no_such_attribute(name: &str) -> Self {
        Self::new(
            Code::NotFound,
            format!("No value with name \"{}\" found in Activation", name),
        )
    }

    /// Create a key not found error.
    pub fn no_such_key(key: &str) -> Self {
        Self::new(Code::NotFound, format!("Key not found in map : {}", key))
    }

    /// Create a field not found error.
    pub fn no_such_field(field: &str) -> Self {
        Self::new(Code::NotFound, format!("no_such_field : {}", field))
    }

    /// Create an error for an attribute declared missing by the activation.
    pub fn missing_attribute(attribute: &str) -> Self {
        Self::new(
            Code::InvalidArgument,
            format!("MissingAttributeError: {}", attribute),
        )
    }

    /// Create an index out of bounds error.
    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            Code::InvalidArgument,
            format!("index out of bounds: {} (size {})", index, len),
        )
    }

    /// Create an error for a map key of an unsupported kind.
    pub fn invalid_map_key(kind: &str) -> Self {
        Self::new(
            Code::InvalidArgument,
            format!("Invalid map key type: '{}'", kind),
        )
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// Create an invalid conversion error.
    pub fn invalid_conversion(from: &str, to: &str) -> Self {
        Self::new(
            Code::InvalidArgument,
            format!("cannot convert {} to {}", from, to),
        )
    }

    /// Create a range error.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(Code::OutOfRange, message)
    }

    /// Create the error reported when a lazy function binds ambiguously.
    pub fn unresolved_function(name: &str) -> Self {
        Self::new(
            Code::Internal,
            format!("Couldn't resolve function {}", name),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

impl From<&str> for EvalError {
    fn from(s: &str) -> Self {
        Self::new(Code::Internal, s)
    }
}

impl From<String> for EvalError {
    fn from(s: String) -> Self {
        Self::new(Code::Internal, s)
    }
}

/// A fatal failure that aborts evaluation.
///
/// Unlike [`EvalError`], these are never produced as values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// A step needed more operands than the stack held.
    #[error("stack underflow at step {pc}: needed {needed} values, found {available}")]
    StackUnderflow {
        pc: usize,
        needed: usize,
        available: usize,
    },

    /// Evaluation finished without exactly one value on the stack.
    #[error("evaluation left {0} values on the stack, expected exactly one")]
    StackImbalance(usize),

    /// The recursive evaluator nested deeper than allowed.
    #[error("max recursion depth of {0} exceeded")]
    RecursionDepthExceeded(usize),

    /// The execution path is internally inconsistent.
    #[error("malformed execution path: {0}")]
    MalformedPath(String),

    /// The type provider failed while servicing the evaluator.
    #[error("type provider failure: {0}")]
    Provider(#[from] ProviderError),
}

/// A failure reported by a type provider.
///
/// "Not found" is never a provider failure; lookups report absence with `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A function registration rejected by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The overload collides with one already registered under the same name
    /// and call style.
    #[error("ALREADY_EXISTS: overload conflicts with existing registration: {signature}")]
    AlreadyExists { signature: String },
}

/// A failure while compiling an expression tree into a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The expression tree nests deeper than the configured maximum.
    #[error("max recursion depth of {0} exceeded while planning")]
    RecursionLimit(usize),

    /// The expression tree contains a node the planner cannot compile.
    #[error("unsupported expression at node {id}: {reason}")]
    Unsupported { id: i64, reason: String },

    /// The type provider failed during name resolution.
    #[error("type provider failure: {0}")]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_and_division_use_distinct_codes() {
        assert_eq!(EvalError::overflow("int64 overflow").code, Code::OutOfRange);
        assert_eq!(EvalError::division_by_zero().code, Code::InvalidArgument);
        assert_eq!(EvalError::modulo_by_zero().code, Code::InvalidArgument);
    }

    #[test]
    fn no_matching_overload_carries_signature() {
        let err = EvalError::no_matching_overload("_+_(int64, uint64)");
        assert_eq!(err.code, Code::Unknown);
        assert!(err.message.contains("_+_(int64, uint64)"));
    }

    #[test]
    fn errors_compare_by_code_and_message() {
        assert_eq!(
            EvalError::no_such_key("a"),
            EvalError::new(Code::NotFound, "Key not found in map : a")
        );
        assert_ne!(
            EvalError::new(Code::Internal, "x"),
            EvalError::new(Code::Unknown, "x")
        );
    }

    #[test]
    fn exec_error_display() {
        let err = ExecError::StackUnderflow {
            pc: 3,
            needed: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "stack underflow at step 3: needed 2 values, found 1"
        );
        assert_eq!(
            ExecError::RecursionDepthExceeded(8).to_string(),
            "max recursion depth of 8 exceeded"
        );
    }

    #[test]
    fn provider_error_converts_into_fatal_errors() {
        let exec: ExecError = ProviderError::new("backend offline").into();
        assert_eq!(exec.to_string(), "type provider failure: backend offline");
        let plan: PlanError = ProviderError::new("backend offline").into();
        assert!(matches!(plan, PlanError::Provider(_)));
    }
}
