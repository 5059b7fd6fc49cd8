//! Runtime bindings for CEL evaluation.
//!
//! An `Activation` supplies variable values, implementations for lazily
//! registered functions, and the attribute patterns that mark parts of the
//! input as unknown or missing.

use std::collections::HashMap;
use std::sync::Arc;

use super::{AttributePattern, FunctionDescriptor, FunctionImpl, Overload, RegistryError, Value};

/// Per-evaluation inputs.
///
/// Activations are only read during evaluation; one activation may serve
/// several concurrent evaluations as long as nothing mutates it meanwhile.
pub trait Activation: Send + Sync {
    /// The value bound to `name`, if any.
    fn resolve(&self, name: &str) -> Option<Value>;

    /// Implementations bound for lazily registered functions named `name`.
    fn find_function_overloads(&self, _name: &str) -> Vec<Overload> {
        Vec::new()
    }

    /// Attributes that evaluate to unknown sets.
    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        &[]
    }

    /// Attributes that evaluate to a missing attribute error.
    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        &[]
    }
}

/// An activation that owns its bindings, functions, and patterns.
#[derive(Debug, Clone, Default)]
pub struct MapActivation {
    bindings: HashMap<String, Value>,
    functions: HashMap<String, Vec<Overload>>,
    unknown_patterns: Vec<AttributePattern>,
    missing_patterns: Vec<AttributePattern>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Bind an implementation for a lazily registered function.
    ///
    /// Binding the same name, call style, and argument kinds twice is
    /// rejected.
    pub fn insert_function(
        &mut self,
        descriptor: FunctionDescriptor,
        implementation: FunctionImpl,
    ) -> Result<(), RegistryError> {
        let overloads = self.functions.entry(descriptor.name.clone()).or_default();
        let duplicate = overloads.iter().any(|o| {
            o.descriptor.receiver_style == descriptor.receiver_style
                && o.descriptor.arg_kinds == descriptor.arg_kinds
        });
        if duplicate {
            return Err(RegistryError::AlreadyExists {
                signature: descriptor.signature(),
            });
        }
        overloads.push(Overload::new(descriptor, implementation));
        Ok(())
    }

    /// Declare an attribute pattern as unknown.
    pub fn add_unknown_pattern(&mut self, pattern: AttributePattern) {
        self.unknown_patterns.push(pattern);
    }

    /// Declare an attribute pattern as missing.
    pub fn add_missing_pattern(&mut self, pattern: AttributePattern) {
        self.missing_patterns.push(pattern);
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_unknown_pattern(mut self, pattern: AttributePattern) -> Self {
        self.add_unknown_pattern(pattern);
        self
    }

    pub fn with_missing_pattern(mut self, pattern: AttributePattern) -> Self {
        self.add_missing_pattern(pattern);
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapActivation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(bindings: I) -> Self {
        let mut activation = Self::new();
        for (name, value) in bindings {
            activation.insert(name, value);
        }
        activation
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    fn find_function_overloads(&self, name: &str) -> Vec<Overload> {
        self.functions.get(name).cloned().unwrap_or_default()
    }

    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        &self.unknown_patterns
    }

    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        &self.missing_patterns
    }
}

/// Binds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl<T: Activation + ?Sized> Activation for Arc<T> {
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }

    fn find_function_overloads(&self, name: &str) -> Vec<Overload> {
        (**self).find_function_overloads(name)
    }

    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        (**self).unknown_attribute_patterns()
    }

    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        (**self).missing_attribute_patterns()
    }
}

impl<T: Activation + ?Sized> Activation for &T {
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }

    fn find_function_overloads(&self, name: &str) -> Vec<Overload> {
        (**self).find_function_overloads(name)
    }

    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        (**self).unknown_attribute_patterns()
    }

    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        (**self).missing_attribute_patterns()
    }
}
