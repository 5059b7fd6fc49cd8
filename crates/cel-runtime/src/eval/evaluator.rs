//! Iterative evaluator over a flat execution path.
//!
//! Steps run in order against an explicit value stack; control steps move
//! the program counter. No host recursion is used, so arbitrarily nested
//! expressions evaluate in constant call-stack space.

use super::frame::{ternary_condition_signal, Frame, Slot};
use super::path::{ExecutionPath, Step};
use super::{ExecError, Value};

/// Runs one execution path against one frame.
pub struct Evaluator<'p, 'a> {
    path: &'p ExecutionPath,
    frame: Frame<'a>,
    stack: Vec<Slot>,
}

impl<'p, 'a> Evaluator<'p, 'a> {
    pub(crate) fn new(path: &'p ExecutionPath, frame: Frame<'a>) -> Self {
        Self {
            path,
            frame,
            stack: Vec::with_capacity(path.len().min(64)),
        }
    }

    fn pop(&mut self, pc: usize) -> Result<Slot, ExecError> {
        self.stack.pop().ok_or(ExecError::StackUnderflow {
            pc,
            needed: 1,
            available: 0,
        })
    }

    fn pop_n(&mut self, pc: usize, n: usize) -> Result<Vec<Slot>, ExecError> {
        let available = self.stack.len();
        if available < n {
            return Err(ExecError::StackUnderflow {
                pc,
                needed: n,
                available,
            });
        }
        Ok(self.stack.split_off(available - n))
    }

    fn push(&mut self, slot: Slot, id: i64, trace: &mut dyn FnMut(i64, &Value)) {
        trace(id, &slot.value);
        self.stack.push(slot);
    }

    fn check_target(&self, pc: usize, target: usize) -> Result<usize, ExecError> {
        if target > self.path.len() {
            return Err(ExecError::MalformedPath(format!(
                "step {} jumps to {} beyond path of length {}",
                pc,
                target,
                self.path.len()
            )));
        }
        Ok(target)
    }

    /// Execute the path to completion.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn run(mut self, trace: &mut dyn FnMut(i64, &Value)) -> Result<Value, ExecError> {
        let path = self.path;
        let steps = path.steps();
        let mut pc = 0;
        while let Some(step) = steps.get(pc) {
            tracing::trace!(pc, step = %step, depth = self.stack.len(), "step");
            let mut next = pc + 1;
            match step {
                Step::Const { id, value } => {
                    self.push(Slot::new(value.clone()), *id, trace);
                }
                Step::Ident { id, name } => {
                    let slot = self.frame.ident(name);
                    self.push(slot, *id, trace);
                }
                Step::Select {
                    id,
                    field,
                    test_only,
                } => {
                    let operand = self.pop(pc)?;
                    let slot = self.frame.select(operand, field, *test_only);
                    self.push(slot, *id, trace);
                }
                Step::Index { id } => {
                    let mut operands = self.pop_n(pc, 2)?;
                    let key = operands.pop();
                    let operand = operands.pop();
                    let (Some(operand), Some(key)) = (operand, key) else {
                        return Err(ExecError::MalformedPath("index operands".to_string()));
                    };
                    let slot = self.frame.index(operand, key);
                    self.push(slot, *id, trace);
                }
                Step::Call { id, target } => {
                    let args = self.pop_n(pc, target.arity)?;
                    let value = self.frame.call(target, *id, &args)?;
                    self.push(Slot::new(value), *id, trace);
                }
                Step::CreateList { id, len } => {
                    let elements = self.pop_n(pc, *len)?;
                    let value = self.frame.create_list(elements);
                    self.push(Slot::new(value), *id, trace);
                }
                Step::CreateMap { id, len } => {
                    let entries = self.pop_n(pc, len * 2)?;
                    let value = self.frame.create_map(entries);
                    self.push(Slot::new(value), *id, trace);
                }
                Step::CreateStruct {
                    id,
                    type_name,
                    fields,
                } => {
                    let values = self.pop_n(pc, fields.len())?;
                    let value = self.frame.create_struct(type_name, fields, values);
                    self.push(Slot::new(value), *id, trace);
                }
                Step::LogicShortCircuit { id, op, target } => {
                    let top = self.stack.last().ok_or(ExecError::StackUnderflow {
                        pc,
                        needed: 1,
                        available: 0,
                    })?;
                    if top.value.as_bool() == Some(op.short_circuit_value()) {
                        trace(*id, &top.value);
                        next = self.check_target(pc, *target)?;
                    }
                }
                Step::Logic { id, op } => {
                    let mut operands = self.pop_n(pc, 2)?;
                    let rhs = operands.pop();
                    let lhs = operands.pop();
                    let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                        return Err(ExecError::MalformedPath("logic operands".to_string()));
                    };
                    let value = self.frame.logic(*op, lhs, rhs);
                    self.push(Slot::new(value), *id, trace);
                }
                Step::TernaryBranch { else_target, end } => {
                    let condition = self.pop(pc)?;
                    match condition.value {
                        Value::Bool(true) => {}
                        Value::Bool(false) => next = self.check_target(pc, *else_target)?,
                        other => {
                            self.stack.push(Slot::new(ternary_condition_signal(other)));
                            next = self.check_target(pc, *end)?;
                        }
                    }
                }
                Step::Ternary => {
                    let mut operands = self.pop_n(pc, 3)?;
                    let else_value = operands.pop();
                    let then_value = operands.pop();
                    let condition = operands.pop();
                    let (Some(condition), Some(then_value), Some(else_value)) =
                        (condition, then_value, else_value)
                    else {
                        return Err(ExecError::MalformedPath("ternary operands".to_string()));
                    };
                    let slot = self.frame.ternary(condition, then_value, else_value);
                    self.stack.push(slot);
                }
                Step::Jump { target } => {
                    next = self.check_target(pc, *target)?;
                }
                Step::ComprehensionInit {
                    iter_var,
                    accu_var,
                    end,
                } => {
                    let range = self.pop(pc)?;
                    if let Some(result) =
                        self.frame.begin_comprehension(iter_var, accu_var, range.value)
                    {
                        self.stack.push(Slot::new(result));
                        next = self.check_target(pc, *end)?;
                    }
                }
                Step::ComprehensionAccumulate => {
                    let value = self.pop(pc)?;
                    self.frame.set_accumulator(value.value)?;
                }
                Step::ComprehensionNext { result } => {
                    if !self.frame.next_iteration()? {
                        next = self.check_target(pc, *result)?;
                    }
                }
                Step::ComprehensionCond { result } => {
                    let condition = self.pop(pc)?;
                    if !self.frame.loop_condition(condition.value)? {
                        next = self.check_target(pc, *result)?;
                    }
                }
                Step::ComprehensionResult => {
                    self.frame.finish_iterations()?;
                }
                Step::ComprehensionFinish { id } => {
                    self.frame.end_comprehension()?;
                    if let Some(top) = self.stack.last() {
                        trace(*id, &top.value);
                    }
                }
            }
            pc = next;
        }

        if self.frame.scope_depth() != 0 {
            return Err(ExecError::MalformedPath(format!(
                "{} comprehension scopes left open",
                self.frame.scope_depth()
            )));
        }
        match self.stack.len() {
            1 => self
                .stack
                .pop()
                .map(|slot| slot.value)
                .ok_or(ExecError::StackImbalance(0)),
            n => Err(ExecError::StackImbalance(n)),
        }
    }
}
