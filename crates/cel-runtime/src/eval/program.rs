//! Planned CEL program ready for evaluation.
//!
//! A `Program` owns everything evaluation needs: the planned tree, the flat
//! execution path compiled from it, the options it was planned with, and the
//! type provider. It holds no per-evaluation state, so one program can be
//! shared across threads and evaluated against many activations.

use std::fmt;
use std::sync::Arc;

use super::frame::Frame;
use super::{
    Activation, DirectEvaluator, EvaluationMode, Evaluator, ExecError, ExecutionPath, PlanNode,
    RuntimeOptions, TypeProvider, Value,
};

/// A planned CEL expression.
#[derive(Clone)]
pub struct Program {
    root: Arc<PlanNode>,
    path: Arc<ExecutionPath>,
    options: RuntimeOptions,
    provider: Arc<dyn TypeProvider>,
    warnings: Vec<String>,
}

impl Program {
    pub(crate) fn new(
        root: PlanNode,
        options: RuntimeOptions,
        provider: Arc<dyn TypeProvider>,
        warnings: Vec<String>,
    ) -> Self {
        let path = ExecutionPath::compile(&root, options.short_circuiting);
        tracing::debug!(steps = path.len(), warnings = warnings.len(), "planned program");
        Self {
            root: Arc::new(root),
            path: Arc::new(path),
            options,
            provider,
            warnings,
        }
    }

    /// Evaluate the program against `activation`.
    ///
    /// In-band errors and unknowns are returned as `Ok` values; `Err` means
    /// evaluation could not complete at all.
    pub fn evaluate(&self, activation: &dyn Activation) -> Result<Value, ExecError> {
        self.run(activation, &mut |_, _| {})
    }

    /// Evaluate the program, calling `callback` with the node id and value
    /// after every value-producing step.
    pub fn trace<F>(&self, activation: &dyn Activation, mut callback: F) -> Result<Value, ExecError>
    where
        F: FnMut(i64, &Value),
    {
        self.run(activation, &mut callback)
    }

    fn run(
        &self,
        activation: &dyn Activation,
        trace: &mut dyn FnMut(i64, &Value),
    ) -> Result<Value, ExecError> {
        let frame = Frame::new(activation, self.provider.as_ref(), &self.options);
        match self.options.evaluation_mode {
            EvaluationMode::Iterative => Evaluator::new(&self.path, frame).run(trace),
            EvaluationMode::Recursive => DirectEvaluator::new(frame).run(&self.root, trace),
        }
    }

    /// Warnings collected while planning, such as calls to functions with
    /// no registered overloads.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The flat step list run by the iterative evaluator.
    pub fn execution_path(&self) -> &ExecutionPath {
        &self.path
    }

    /// The planned expression tree.
    pub fn plan(&self) -> &PlanNode {
        &self.root
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("root", &self.root)
            .field("steps", &self.path.len())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{MapActivation, PlanKind, StaticTypeProvider};

    fn program(root: PlanNode, mode: EvaluationMode) -> Program {
        Program::new(
            root,
            RuntimeOptions::default().with_evaluation_mode(mode),
            Arc::new(StaticTypeProvider::new()),
            Vec::new(),
        )
    }

    fn list_of_ident() -> PlanNode {
        PlanNode::new(
            2,
            PlanKind::CreateList(vec![PlanNode::new(1, PlanKind::Ident(Arc::from("x")))]),
        )
    }

    #[test]
    fn evaluates_in_both_modes() {
        let activation = MapActivation::new().with_binding("x", 7);
        for mode in [EvaluationMode::Iterative, EvaluationMode::Recursive] {
            let result = program(list_of_ident(), mode).evaluate(&activation).unwrap();
            assert_eq!(result, Value::from(vec![Value::Int(7)]));
        }
    }

    #[test]
    fn trace_reports_node_ids_in_order() {
        let activation = MapActivation::new().with_binding("x", 7);
        for mode in [EvaluationMode::Iterative, EvaluationMode::Recursive] {
            let mut seen = Vec::new();
            program(list_of_ident(), mode)
                .trace(&activation, |id, _| seen.push(id))
                .unwrap();
            assert_eq!(seen, vec![1, 2]);
        }
    }

    #[test]
    fn recursion_limit_is_fatal() {
        let mut node = PlanNode::new(0, PlanKind::Const(Value::Int(0)));
        for id in 1..10 {
            node = PlanNode::new(id, PlanKind::CreateList(vec![node]));
        }
        let options = RuntimeOptions::default()
            .with_evaluation_mode(EvaluationMode::Recursive)
            .with_max_recursion_depth(4);
        let program = Program::new(node, options, Arc::new(StaticTypeProvider::new()), vec![]);
        assert_eq!(
            program.evaluate(&MapActivation::new()),
            Err(ExecError::RecursionDepthExceeded(4))
        );
    }
}
