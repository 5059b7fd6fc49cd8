//! Runtime configuration.

/// How unknown markers are produced during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProcessing {
    /// Unknown attribute patterns are ignored.
    #[default]
    Disabled,
    /// Attributes matching unknown patterns evaluate to unknown sets.
    AttributeOnly,
    /// As `AttributeOnly`, and functions returning unknowns are recorded as
    /// function-result markers.
    AttributeAndFunction,
}

impl UnknownProcessing {
    /// True if attribute patterns are honoured.
    pub fn attributes_enabled(&self) -> bool {
        !matches!(self, UnknownProcessing::Disabled)
    }

    /// True if function-result markers are recorded.
    pub fn functions_enabled(&self) -> bool {
        matches!(self, UnknownProcessing::AttributeAndFunction)
    }
}

/// Which evaluator runs a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Flat execution path over an explicit value stack.
    #[default]
    Iterative,
    /// Direct recursive evaluation of the plan tree, bounded by
    /// `max_recursion_depth`.
    Recursive,
}

/// Options controlling planning and evaluation.
///
/// Owned by the embedder and passed explicitly to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Namespace used for name resolution, e.g. `google.api.expr`.
    pub container: String,
    /// Skip the unselected branch of `&&`, `||` and `?:`.
    pub short_circuiting: bool,
    pub unknown_processing: UnknownProcessing,
    /// Honour the activation's missing attribute patterns.
    pub enable_missing_attribute_errors: bool,
    /// Register `_==_`/`_!=_` across kinds instead of per kind.
    pub enable_heterogeneous_equality: bool,
    /// Allow qualified names to resolve to type values.
    pub enable_qualified_type_identifiers: bool,
    pub max_recursion_depth: usize,
    pub evaluation_mode: EvaluationMode,
    /// Upper bound on loop iterations per evaluation; 0 means unlimited.
    pub max_comprehension_iterations: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            container: String::new(),
            short_circuiting: true,
            unknown_processing: UnknownProcessing::Disabled,
            enable_missing_attribute_errors: false,
            enable_heterogeneous_equality: true,
            enable_qualified_type_identifiers: false,
            max_recursion_depth: 256,
            evaluation_mode: EvaluationMode::Iterative,
            max_comprehension_iterations: 0,
        }
    }
}

impl RuntimeOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container namespace.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Enable or disable short-circuit evaluation.
    pub fn with_short_circuiting(mut self, enabled: bool) -> Self {
        self.short_circuiting = enabled;
        self
    }

    /// Set how unknowns are processed.
    pub fn with_unknown_processing(mut self, mode: UnknownProcessing) -> Self {
        self.unknown_processing = mode;
        self
    }

    /// Enable or disable missing attribute errors.
    pub fn with_missing_attribute_errors(mut self, enabled: bool) -> Self {
        self.enable_missing_attribute_errors = enabled;
        self
    }

    /// Enable or disable heterogeneous equality.
    pub fn with_heterogeneous_equality(mut self, enabled: bool) -> Self {
        self.enable_heterogeneous_equality = enabled;
        self
    }

    /// Enable or disable qualified type identifiers.
    pub fn with_qualified_type_identifiers(mut self, enabled: bool) -> Self {
        self.enable_qualified_type_identifiers = enabled;
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Select the evaluator.
    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    /// Bound loop iterations; 0 disables the bound.
    pub fn with_max_comprehension_iterations(mut self, limit: usize) -> Self {
        self.max_comprehension_iterations = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = RuntimeOptions::default();
        assert!(options.short_circuiting);
        assert!(options.enable_heterogeneous_equality);
        assert!(!options.enable_missing_attribute_errors);
        assert_eq!(options.max_recursion_depth, 256);
        assert_eq!(options.evaluation_mode, EvaluationMode::Iterative);
        assert!(!options.unknown_processing.attributes_enabled());
    }

    #[test]
    fn builder() {
        let options = RuntimeOptions::new()
            .with_container("google.api.expr")
            .with_unknown_processing(UnknownProcessing::AttributeAndFunction)
            .with_max_comprehension_iterations(10);
        assert_eq!(options.container, "google.api.expr");
        assert!(options.unknown_processing.functions_enabled());
        assert_eq!(options.max_comprehension_iterations, 10);
    }
}
