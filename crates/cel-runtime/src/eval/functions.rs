//! Function descriptors, implementations, and the overload registry.
//!
//! Overloads come in two flavours:
//!
//! - **static** overloads carry their implementation and can be bound when a
//!   program is planned;
//! - **lazy** overloads register only a descriptor. The implementation is
//!   supplied later by the activation and bound when the call executes.
//!
//! Registration enforces the non-strict exclusivity rule: a non-strict
//! overload must be the only overload of its name and call style.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::{ExecError, Kind, RegistryError, Value};

/// The signature of one overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDescriptor {
    /// The function name, possibly namespaced (`cel.fake_ns_func`).
    pub name: String,
    /// Whether the function is called as `a.f(b)` rather than `f(a, b)`.
    pub receiver_style: bool,
    /// Argument kinds, receiver first for receiver-style overloads.
    pub arg_kinds: Vec<Kind>,
    /// Strict functions never see error or unknown arguments.
    pub is_strict: bool,
}

impl FunctionDescriptor {
    /// Create a strict descriptor.
    pub fn new(name: impl Into<String>, receiver_style: bool, arg_kinds: Vec<Kind>) -> Self {
        Self {
            name: name.into(),
            receiver_style,
            arg_kinds,
            is_strict: true,
        }
    }

    /// Mark the descriptor as non-strict.
    pub fn non_strict(mut self) -> Self {
        self.is_strict = false;
        self
    }

    /// The number of arguments, counting the receiver.
    pub fn arity(&self) -> usize {
        self.arg_kinds.len()
    }

    /// True if `kinds` positionally matches this descriptor.
    ///
    /// `Any` on either side matches every kind.
    pub fn matches_kinds(&self, kinds: &[Kind]) -> bool {
        self.arg_kinds.len() == kinds.len()
            && self
                .arg_kinds
                .iter()
                .zip(kinds)
                .all(|(declared, actual)| declared.is_compatible(*actual))
    }

    /// True if this descriptor would be shadowed by, or would shadow, `other`.
    fn conflicts_with(&self, other: &FunctionDescriptor) -> bool {
        if self.name != other.name || self.receiver_style != other.receiver_style {
            return false;
        }
        if !self.is_strict || !other.is_strict {
            return true;
        }
        self.matches_kinds(&other.arg_kinds)
    }

    /// The call signature, e.g. `_+_(int64, uint64)`.
    pub fn signature(&self) -> String {
        call_signature(&self.name, &self.arg_kinds)
    }
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.receiver_style {
            write!(f, "receiver ")?;
        }
        write!(f, "{}", self.signature())?;
        if !self.is_strict {
            write!(f, " [non-strict]")?;
        }
        Ok(())
    }
}

/// Render a call signature from a name and argument kinds.
pub fn call_signature(name: &str, kinds: &[Kind]) -> String {
    let args: Vec<&str> = kinds.iter().map(Kind::name).collect();
    format!("{}({})", name, args.join(", "))
}

/// A callable overload implementation.
///
/// The implementation receives the already-evaluated arguments (receiver
/// first for receiver-style calls). In-band failures are returned as
/// `Value::Error`; the `Err` side is reserved for fatal failures.
pub trait Function: Send + Sync {
    fn invoke(&self, args: &[Value]) -> Result<Value, ExecError>;
}

impl<F> Function for F
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    fn invoke(&self, args: &[Value]) -> Result<Value, ExecError> {
        Ok(self(args))
    }
}

/// A shared function implementation.
pub type FunctionImpl = Arc<dyn Function>;

/// Helper trait for creating function implementations from closures.
pub trait IntoFunctionImpl {
    fn into_impl(self) -> FunctionImpl;
}

impl<F> IntoFunctionImpl for F
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    fn into_impl(self) -> FunctionImpl {
        Arc::new(self)
    }
}

/// A descriptor paired with its implementation.
#[derive(Clone)]
pub struct Overload {
    pub descriptor: FunctionDescriptor,
    pub implementation: FunctionImpl,
}

impl Overload {
    /// Create a new overload.
    pub fn new(descriptor: FunctionDescriptor, implementation: FunctionImpl) -> Self {
        Self {
            descriptor,
            implementation,
        }
    }

    /// Call this overload with the given arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, ExecError> {
        self.implementation.invoke(args)
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
struct FunctionEntry {
    overloads: Vec<Overload>,
    lazy: Vec<FunctionDescriptor>,
}

impl FunctionEntry {
    fn descriptors(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.overloads
            .iter()
            .map(|o| &o.descriptor)
            .chain(self.lazy.iter())
    }
}

/// Registry of all functions available during planning and evaluation.
///
/// The registry is filled before any evaluation starts and is read-only while
/// programs run, so it may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionEntry>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static overload.
    pub fn register(
        &mut self,
        descriptor: FunctionDescriptor,
        implementation: FunctionImpl,
    ) -> Result<(), RegistryError> {
        self.check_conflicts(&descriptor)?;
        self.functions
            .entry(descriptor.name.clone())
            .or_default()
            .overloads
            .push(Overload::new(descriptor, implementation));
        Ok(())
    }

    /// Register a closure as a static overload.
    pub fn register_fn<F>(&mut self, descriptor: FunctionDescriptor, f: F) -> Result<(), RegistryError>
    where
        F: IntoFunctionImpl,
    {
        self.register(descriptor, f.into_impl())
    }

    /// Register a lazy overload whose implementation is bound by the activation.
    pub fn register_lazy(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        self.check_conflicts(&descriptor)?;
        self.functions
            .entry(descriptor.name.clone())
            .or_default()
            .lazy
            .push(descriptor);
        Ok(())
    }

    fn check_conflicts(&self, descriptor: &FunctionDescriptor) -> Result<(), RegistryError> {
        let Some(entry) = self.functions.get(&descriptor.name) else {
            return Ok(());
        };
        if let Some(existing) = entry.descriptors().find(|d| d.conflicts_with(descriptor)) {
            tracing::debug!(
                new = %descriptor,
                existing = %existing,
                "rejecting conflicting overload registration"
            );
            return Err(RegistryError::AlreadyExists {
                signature: descriptor.signature(),
            });
        }
        Ok(())
    }

    /// Static overloads matching the name, call style, and argument kinds, in
    /// registration order.
    pub fn find_static_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        kinds: &[Kind],
    ) -> Vec<&Overload> {
        self.functions
            .get(name)
            .map(|entry| {
                entry
                    .overloads
                    .iter()
                    .filter(|o| {
                        o.descriptor.receiver_style == receiver_style
                            && o.descriptor.matches_kinds(kinds)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lazy descriptors matching the name, call style, and argument kinds, in
    /// registration order.
    pub fn find_lazy_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        kinds: &[Kind],
    ) -> Vec<&FunctionDescriptor> {
        self.functions
            .get(name)
            .map(|entry| {
                entry
                    .lazy
                    .iter()
                    .filter(|d| d.receiver_style == receiver_style && d.matches_kinds(kinds))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if any overload, static or lazy, is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Every registered descriptor, keyed by function name.
    pub fn list_functions(&self) -> BTreeMap<String, Vec<FunctionDescriptor>> {
        self.functions
            .iter()
            .map(|(name, entry)| (name.clone(), entry.descriptors().cloned().collect()))
            .collect()
    }

    /// Get the number of registered function names.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double_int(args: &[Value]) -> Value {
        match args.first() {
            Some(Value::Int(i)) => Value::Int(i * 2),
            _ => Value::error("expected int"),
        }
    }

    fn desc(name: &str, kinds: Vec<Kind>) -> FunctionDescriptor {
        FunctionDescriptor::new(name, false, kinds)
    }

    #[test]
    fn test_overload_call() {
        let overload = Overload::new(desc("double", vec![Kind::Int]), double_int.into_impl());
        let result = overload.call(&[Value::Int(21)]);
        assert_eq!(result, Ok(Value::Int(42)));
    }

    #[test]
    fn test_matching_rule() {
        let d = desc("f", vec![Kind::Int, Kind::Any]);
        assert!(d.matches_kinds(&[Kind::Int, Kind::String]));
        assert!(d.matches_kinds(&[Kind::Any, Kind::Any]));
        assert!(!d.matches_kinds(&[Kind::UInt, Kind::String]));
        assert!(!d.matches_kinds(&[Kind::Int]));
    }

    #[test]
    fn test_find_static_overloads_in_registration_order() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("f", vec![Kind::Int]), double_int)
            .unwrap();
        registry
            .register_fn(desc("f", vec![Kind::String]), double_int)
            .unwrap();
        registry
            .register_fn(FunctionDescriptor::new("f", true, vec![Kind::Int]), double_int)
            .unwrap();

        let found = registry.find_static_overloads("f", false, &[Kind::Any]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].descriptor.arg_kinds, vec![Kind::Int]);
        assert_eq!(found[1].descriptor.arg_kinds, vec![Kind::String]);

        let receiver = registry.find_static_overloads("f", true, &[Kind::Int]);
        assert_eq!(receiver.len(), 1);
        assert!(registry.find_static_overloads("g", false, &[Kind::Int]).is_empty());
    }

    #[test]
    fn test_exact_duplicate_rejected() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("f", vec![Kind::Int]), double_int)
            .unwrap();
        let err = registry
            .register_fn(desc("f", vec![Kind::Int]), double_int)
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));
    }

    #[test]
    fn test_any_overlap_rejected() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("f", vec![Kind::Int]), double_int)
            .unwrap();
        assert!(registry.register_lazy(desc("f", vec![Kind::Any])).is_err());
    }

    #[test]
    fn test_non_strict_exclusivity() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("f", vec![Kind::Any]).non_strict(), double_int)
            .unwrap();
        assert!(registry
            .register_fn(desc("f", vec![Kind::Int, Kind::Int]), double_int)
            .is_err());
        assert!(registry
            .register_lazy(desc("f", vec![Kind::Int, Kind::Int]).non_strict())
            .is_err());
        // A receiver-style overload under the same name is a different slot.
        assert!(registry
            .register_fn(FunctionDescriptor::new("f", true, vec![Kind::Int]), double_int)
            .is_ok());
    }

    #[test]
    fn test_strict_overloads_with_different_arity() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("f", vec![Kind::Any]), double_int)
            .unwrap();
        assert!(registry
            .register_fn(desc("f", vec![Kind::Any, Kind::Any]), double_int)
            .is_ok());
    }

    #[test]
    fn test_lazy_overloads() {
        let mut registry = FunctionRegistry::new();
        registry.register_lazy(desc("lazy", vec![Kind::Int])).unwrap();
        assert!(registry.find_static_overloads("lazy", false, &[Kind::Int]).is_empty());
        assert_eq!(registry.find_lazy_overloads("lazy", false, &[Kind::Any]).len(), 1);
        assert!(registry.contains("lazy"));
    }

    #[test]
    fn test_list_functions() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_fn(desc("a", vec![Kind::Int]), double_int)
            .unwrap();
        registry.register_lazy(desc("a", vec![Kind::String])).unwrap();
        registry
            .register_fn(desc("b", vec![]), double_int)
            .unwrap();

        let listed = registry.list_functions();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed["a"].len(), 2);
        assert_eq!(listed["b"][0].arity(), 0);
    }

    #[test]
    fn test_signature() {
        let d = desc("_+_", vec![Kind::Int, Kind::UInt]);
        assert_eq!(d.signature(), "_+_(int64, uint64)");
    }
}
