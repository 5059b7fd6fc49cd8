//! Recursive evaluator over the plan tree.
//!
//! Each node evaluates its children directly. Nesting is bounded by
//! `max_recursion_depth`; exceeding it aborts the evaluation.

use super::frame::{ternary_condition_signal, Frame, Slot};
use super::plan::{PlanKind, PlanNode, PlannedComprehension};
use super::{ExecError, Value};

pub struct DirectEvaluator<'a> {
    frame: Frame<'a>,
    max_depth: usize,
    depth: usize,
}

impl<'a> DirectEvaluator<'a> {
    pub(crate) fn new(frame: Frame<'a>) -> Self {
        let max_depth = frame.options().max_recursion_depth;
        Self {
            frame,
            max_depth,
            depth: 0,
        }
    }

    /// Evaluate `node` to completion.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn run(
        mut self,
        node: &PlanNode,
        trace: &mut dyn FnMut(i64, &Value),
    ) -> Result<Value, ExecError> {
        self.eval(node, trace).map(|slot| slot.value)
    }

    fn eval(&mut self, node: &PlanNode, trace: &mut dyn FnMut(i64, &Value)) -> Result<Slot, ExecError> {
        if self.depth >= self.max_depth {
            tracing::debug!(max_depth = self.max_depth, "recursion depth exceeded");
            return Err(ExecError::RecursionDepthExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = self.eval_node(node, trace);
        self.depth -= 1;
        result
    }

    fn eval_node(
        &mut self,
        node: &PlanNode,
        trace: &mut dyn FnMut(i64, &Value),
    ) -> Result<Slot, ExecError> {
        let id = node.id;
        let slot = match &node.kind {
            PlanKind::Const(value) => Slot::new(value.clone()),
            PlanKind::Ident(name) => self.frame.ident(name),
            PlanKind::Select {
                operand,
                field,
                test_only,
            } => {
                let operand = self.eval(operand, trace)?;
                self.frame.select(operand, field, *test_only)
            }
            PlanKind::Index { operand, index } => {
                let operand = self.eval(operand, trace)?;
                let key = self.eval(index, trace)?;
                self.frame.index(operand, key)
            }
            PlanKind::Call { target, args } => {
                let args = self.eval_all(args, trace)?;
                Slot::new(self.frame.call(target, id, &args)?)
            }
            PlanKind::Logic { op, lhs, rhs } => {
                let lhs = self.eval(lhs, trace)?;
                if self.frame.options().short_circuiting
                    && lhs.value.as_bool() == Some(op.short_circuit_value())
                {
                    trace(id, &lhs.value);
                    return Ok(lhs);
                }
                let rhs = self.eval(rhs, trace)?;
                Slot::new(self.frame.logic(*op, lhs, rhs))
            }
            PlanKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.eval(condition, trace)?;
                if self.frame.options().short_circuiting {
                    return match condition.value {
                        Value::Bool(true) => self.eval(then_branch, trace),
                        Value::Bool(false) => self.eval(else_branch, trace),
                        other => Ok(Slot::new(ternary_condition_signal(other))),
                    };
                }
                let then_value = self.eval(then_branch, trace)?;
                let else_value = self.eval(else_branch, trace)?;
                return Ok(self.frame.ternary(condition, then_value, else_value));
            }
            PlanKind::CreateList(elements) => {
                let elements = self.eval_all(elements, trace)?;
                Slot::new(self.frame.create_list(elements))
            }
            PlanKind::CreateMap(entries) => {
                let mut slots = Vec::with_capacity(entries.len() * 2);
                for (key, value) in entries {
                    slots.push(self.eval(key, trace)?);
                    slots.push(self.eval(value, trace)?);
                }
                Slot::new(self.frame.create_map(slots))
            }
            PlanKind::CreateStruct { type_name, fields } => {
                let mut names = Vec::with_capacity(fields.len());
                let mut values = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    names.push(name.clone());
                    values.push(self.eval(value, trace)?);
                }
                Slot::new(self.frame.create_struct(type_name, &names, values))
            }
            PlanKind::Comprehension(c) => match self.eval_comprehension(c, trace)? {
                Fold::Completed(value) => Slot::new(value),
                // The range decided the result; the fold itself never ran.
                Fold::RangeRejected(value) => return Ok(Slot::new(value)),
            },
        };
        trace(id, &slot.value);
        Ok(slot)
    }

    fn eval_all(
        &mut self,
        nodes: &[PlanNode],
        trace: &mut dyn FnMut(i64, &Value),
    ) -> Result<Vec<Slot>, ExecError> {
        nodes.iter().map(|n| self.eval(n, trace)).collect()
    }

    fn eval_comprehension(
        &mut self,
        c: &PlannedComprehension,
        trace: &mut dyn FnMut(i64, &Value),
    ) -> Result<Fold, ExecError> {
        let range = self.eval(&c.iter_range, trace)?;
        if let Some(signal) = self
            .frame
            .begin_comprehension(&c.iter_var, &c.accu_var, range.value)
        {
            return Ok(Fold::RangeRejected(signal));
        }
        let init = self.eval(&c.accu_init, trace)?;
        self.frame.set_accumulator(init.value)?;
        while self.frame.next_iteration()? {
            let condition = self.eval(&c.loop_condition, trace)?;
            if !self.frame.loop_condition(condition.value)? {
                break;
            }
            let step = self.eval(&c.loop_step, trace)?;
            self.frame.set_accumulator(step.value)?;
        }
        self.frame.finish_iterations()?;
        let result = self.eval(&c.result, trace)?;
        self.frame.end_comprehension()?;
        Ok(Fold::Completed(result.value))
    }
}

enum Fold {
    Completed(Value),
    RangeRejected(Value),
}
