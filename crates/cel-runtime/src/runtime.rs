//! The runtime that turns expression trees into programs.
//!
//! A `Runtime` owns the function registry, the type provider, and the
//! options. It is configured once, then used to plan any number of
//! expressions into [`Program`]s.

use std::sync::Arc;

use crate::ast::{Expr, ReferenceMap};
use crate::eval::{
    register_builtins, EvaluationMode, FunctionDescriptor, FunctionRegistry, IntoFunctionImpl,
    PlanError, Program, RegistryError, Resolver, RuntimeOptions, StaticTypeProvider, TypeProvider,
};
use crate::planner::Planner;

/// Function registry, type provider, and options for planning programs.
///
/// # Example
///
/// ```
/// use cel_runtime::ast::ExprBuilder;
/// use cel_runtime::eval::{EmptyActivation, RuntimeOptions, Value};
/// use cel_runtime::Runtime;
///
/// let runtime = Runtime::new(RuntimeOptions::default()).unwrap();
/// let b = ExprBuilder::new();
/// let program = runtime.plan(&b.call("_+_", vec![b.int(1), b.int(2)])).unwrap();
/// assert_eq!(program.evaluate(&EmptyActivation).unwrap(), Value::Int(3));
/// ```
#[derive(Clone)]
pub struct Runtime {
    registry: FunctionRegistry,
    provider: Arc<dyn TypeProvider>,
    options: RuntimeOptions,
}

impl Runtime {
    /// Create a runtime with the standard builtins and an empty
    /// [`StaticTypeProvider`].
    pub fn new(options: RuntimeOptions) -> Result<Self, RegistryError> {
        let mut registry = FunctionRegistry::new();
        register_builtins(&mut registry, &options)?;
        Ok(Self {
            registry,
            provider: Arc::new(StaticTypeProvider::new()),
            options,
        })
    }

    /// Create a runtime with no functions registered.
    pub fn empty(options: RuntimeOptions) -> Self {
        Self {
            registry: FunctionRegistry::new(),
            provider: Arc::new(StaticTypeProvider::new()),
            options,
        }
    }

    /// Replace the type provider (builder pattern).
    pub fn with_provider(mut self, provider: impl TypeProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Select the evaluator used by planned programs (builder pattern).
    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.options.evaluation_mode = mode;
        self
    }

    /// Register a static overload.
    pub fn register_fn<F>(
        &mut self,
        descriptor: FunctionDescriptor,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: IntoFunctionImpl,
    {
        self.registry.register_fn(descriptor, f)
    }

    /// Register a lazy overload, bound by the activation at call time.
    pub fn register_lazy(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        self.registry.register_lazy(descriptor)
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Plan an unchecked expression tree.
    pub fn plan(&self, expr: &Expr) -> Result<Program, PlanError> {
        self.plan_inner(expr, None)
    }

    /// Plan a checked expression tree, honouring its reference map.
    pub fn plan_checked(
        &self,
        expr: &Expr,
        references: &ReferenceMap,
    ) -> Result<Program, PlanError> {
        self.plan_inner(expr, Some(references))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn plan_inner(
        &self,
        expr: &Expr,
        references: Option<&ReferenceMap>,
    ) -> Result<Program, PlanError> {
        let resolver = Resolver::new(
            &self.options.container,
            &self.registry,
            self.provider.as_ref(),
            self.options.enable_qualified_type_identifiers,
        );
        let (root, warnings) = Planner::new(resolver, &self.options, references).plan(expr)?;
        Ok(Program::new(
            root,
            self.options.clone(),
            self.provider.clone(),
            warnings,
        ))
    }
}
