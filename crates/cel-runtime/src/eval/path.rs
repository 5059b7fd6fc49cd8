//! Flat execution paths.
//!
//! A plan tree is flattened into a linear list of steps that run against an
//! explicit value stack. Every expression compiles to steps whose net stack
//! effect is exactly one pushed value:
//!
//! | step                       | pops | pushes | notes                              |
//! |----------------------------|------|--------|------------------------------------|
//! | `Const`, `Ident`           | 0    | 1      |                                    |
//! | `Select`                   | 1    | 1      |                                    |
//! | `Index`, `Logic`           | 2    | 1      |                                    |
//! | `Call`                     | n    | 1      | n = arity                          |
//! | `CreateList`/`CreateStruct`| n    | 1      |                                    |
//! | `CreateMap`                | 2n   | 1      |                                    |
//! | `Ternary`                  | 3    | 1      | eager form only                    |
//! | `LogicShortCircuit`        | 0    | 0      | peeks; may jump                    |
//! | `TernaryBranch`            | 1    | 0/1    | pushes only when it jumps to end   |
//! | `Jump`                     | 0    | 0      |                                    |
//! | `ComprehensionInit`        | 1    | 0/1    | pushes only when it jumps to end   |
//! | `ComprehensionAccumulate`  | 1    | 0      |                                    |
//! | `ComprehensionCond`        | 1    | 0      |                                    |
//! | `ComprehensionNext`, `ComprehensionResult`, `ComprehensionFinish` | 0 | 0 | |

use std::fmt;
use std::sync::Arc;

use super::plan::{CallTarget, LogicOp, PlanKind, PlanNode};
use super::Value;

/// One instruction of an execution path.
#[derive(Debug, Clone)]
pub enum Step {
    Const {
        id: i64,
        value: Value,
    },
    Ident {
        id: i64,
        name: Arc<str>,
    },
    Select {
        id: i64,
        field: Arc<str>,
        test_only: bool,
    },
    Index {
        id: i64,
    },
    Call {
        id: i64,
        target: Arc<CallTarget>,
    },
    CreateList {
        id: i64,
        len: usize,
    },
    CreateMap {
        id: i64,
        len: usize,
    },
    CreateStruct {
        id: i64,
        type_name: Arc<str>,
        fields: Arc<[Arc<str>]>,
    },
    /// Jump to `target` if the top of the stack decides `op` on its own.
    LogicShortCircuit {
        id: i64,
        op: LogicOp,
        target: usize,
    },
    Logic {
        id: i64,
        op: LogicOp,
    },
    /// Pop the condition: fall through on true, jump to `else_target` on false,
    /// otherwise push the condition's signal and jump to `end`.
    TernaryBranch {
        else_target: usize,
        end: usize,
    },
    Ternary,
    Jump {
        target: usize,
    },
    ComprehensionInit {
        iter_var: Arc<str>,
        accu_var: Arc<str>,
        end: usize,
    },
    ComprehensionAccumulate,
    ComprehensionNext {
        result: usize,
    },
    ComprehensionCond {
        result: usize,
    },
    ComprehensionResult,
    ComprehensionFinish {
        id: i64,
    },
}

impl Step {
    /// The originating expression id, or -1 for synthetic control steps.
    pub fn id(&self) -> i64 {
        match self {
            Step::Const { id, .. }
            | Step::Ident { id, .. }
            | Step::Select { id, .. }
            | Step::Index { id }
            | Step::Call { id, .. }
            | Step::CreateList { id, .. }
            | Step::CreateMap { id, .. }
            | Step::CreateStruct { id, .. }
            | Step::LogicShortCircuit { id, .. }
            | Step::Logic { id, .. }
            | Step::ComprehensionFinish { id } => *id,
            _ => -1,
        }
    }

    fn set_jump_target(&mut self, pc: usize) {
        match self {
            Step::LogicShortCircuit { target, .. } | Step::Jump { target } => *target = pc,
            Step::ComprehensionInit { end, .. } => *end = pc,
            Step::ComprehensionNext { result } | Step::ComprehensionCond { result } => {
                *result = pc
            }
            _ => {}
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Const { value, .. } => write!(f, "const {}", value),
            Step::Ident { name, .. } => write!(f, "ident {}", name),
            Step::Select {
                field, test_only, ..
            } => {
                if *test_only {
                    write!(f, "has .{}", field)
                } else {
                    write!(f, "select .{}", field)
                }
            }
            Step::Index { .. } => write!(f, "index"),
            Step::Call { target, .. } => write!(f, "call {}/{}", target.name, target.arity),
            Step::CreateList { len, .. } => write!(f, "list {}", len),
            Step::CreateMap { len, .. } => write!(f, "map {}", len),
            Step::CreateStruct { type_name, .. } => write!(f, "struct {}", type_name),
            Step::LogicShortCircuit { op, target, .. } => {
                write!(f, "short-circuit {} -> {}", op.function_name(), target)
            }
            Step::Logic { op, .. } => write!(f, "logic {}", op.function_name()),
            Step::TernaryBranch { else_target, end } => {
                write!(f, "branch else -> {} end -> {}", else_target, end)
            }
            Step::Ternary => write!(f, "ternary"),
            Step::Jump { target } => write!(f, "jump -> {}", target),
            Step::ComprehensionInit {
                iter_var,
                accu_var,
                end,
            } => write!(f, "fold init {} {} end -> {}", iter_var, accu_var, end),
            Step::ComprehensionAccumulate => write!(f, "fold accumulate"),
            Step::ComprehensionNext { result } => write!(f, "fold next result -> {}", result),
            Step::ComprehensionCond { result } => write!(f, "fold cond result -> {}", result),
            Step::ComprehensionResult => write!(f, "fold result"),
            Step::ComprehensionFinish { .. } => write!(f, "fold finish"),
        }
    }
}

/// An immutable, flattened program.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPath {
    steps: Vec<Step>,
}

impl ExecutionPath {
    /// Flatten a plan tree.
    pub fn compile(node: &PlanNode, short_circuiting: bool) -> Self {
        let mut builder = PathBuilder {
            steps: Vec::new(),
            short_circuiting,
        };
        builder.emit(node);
        Self {
            steps: builder.steps,
        }
    }

    /// Wrap a hand-assembled step list.
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:4}: {}", pc, step)?;
        }
        Ok(())
    }
}

struct PathBuilder {
    steps: Vec<Step>,
    short_circuiting: bool,
}

impl PathBuilder {
    fn push(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    fn pc(&self) -> usize {
        self.steps.len()
    }

    fn patch(&mut self, at: usize, target: usize) {
        if let Some(step) = self.steps.get_mut(at) {
            step.set_jump_target(target);
        }
    }

    fn emit(&mut self, node: &PlanNode) {
        let id = node.id;
        match &node.kind {
            PlanKind::Const(value) => {
                self.push(Step::Const {
                    id,
                    value: value.clone(),
                });
            }
            PlanKind::Ident(name) => {
                self.push(Step::Ident {
                    id,
                    name: name.clone(),
                });
            }
            PlanKind::Select {
                operand,
                field,
                test_only,
            } => {
                self.emit(operand);
                self.push(Step::Select {
                    id,
                    field: field.clone(),
                    test_only: *test_only,
                });
            }
            PlanKind::Index { operand, index } => {
                self.emit(operand);
                self.emit(index);
                self.push(Step::Index { id });
            }
            PlanKind::Call { target, args } => {
                for arg in args {
                    self.emit(arg);
                }
                self.push(Step::Call {
                    id,
                    target: target.clone(),
                });
            }
            PlanKind::Logic { op, lhs, rhs } => {
                self.emit(lhs);
                let jump = self.short_circuiting.then(|| {
                    self.push(Step::LogicShortCircuit {
                        id,
                        op: *op,
                        target: 0,
                    })
                });
                self.emit(rhs);
                self.push(Step::Logic { id, op: *op });
                if let Some(jump) = jump {
                    let end = self.pc();
                    self.patch(jump, end);
                }
            }
            PlanKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.emit(condition);
                if self.short_circuiting {
                    let branch = self.push(Step::TernaryBranch {
                        else_target: 0,
                        end: 0,
                    });
                    self.emit(then_branch);
                    let skip_else = self.push(Step::Jump { target: 0 });
                    let else_target = self.pc();
                    self.emit(else_branch);
                    let end = self.pc();
                    self.patch(skip_else, end);
                    self.steps[branch] = Step::TernaryBranch { else_target, end };
                } else {
                    self.emit(then_branch);
                    self.emit(else_branch);
                    self.push(Step::Ternary);
                }
            }
            PlanKind::CreateList(elements) => {
                for element in elements {
                    self.emit(element);
                }
                self.push(Step::CreateList {
                    id,
                    len: elements.len(),
                });
            }
            PlanKind::CreateMap(entries) => {
                for (key, value) in entries {
                    self.emit(key);
                    self.emit(value);
                }
                self.push(Step::CreateMap {
                    id,
                    len: entries.len(),
                });
            }
            PlanKind::CreateStruct { type_name, fields } => {
                for (_, value) in fields {
                    self.emit(value);
                }
                self.push(Step::CreateStruct {
                    id,
                    type_name: type_name.clone(),
                    fields: fields.iter().map(|(name, _)| name.clone()).collect(),
                });
            }
            PlanKind::Comprehension(c) => {
                self.emit(&c.iter_range);
                let init = self.push(Step::ComprehensionInit {
                    iter_var: c.iter_var.clone(),
                    accu_var: c.accu_var.clone(),
                    end: 0,
                });
                self.emit(&c.accu_init);
                self.push(Step::ComprehensionAccumulate);
                let next = self.push(Step::ComprehensionNext { result: 0 });
                self.emit(&c.loop_condition);
                let cond = self.push(Step::ComprehensionCond { result: 0 });
                self.emit(&c.loop_step);
                self.push(Step::ComprehensionAccumulate);
                self.push(Step::Jump { target: next });
                let result = self.push(Step::ComprehensionResult);
                self.emit(&c.result);
                self.push(Step::ComprehensionFinish { id });
                let end = self.pc();
                self.patch(next, result);
                self.patch(cond, result);
                self.patch(init, end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::plan::PlannedComprehension;

    fn constant(id: i64, v: i64) -> PlanNode {
        PlanNode::new(id, PlanKind::Const(Value::Int(v)))
    }

    #[test]
    fn logic_emits_patched_short_circuit() {
        let node = PlanNode::new(
            3,
            PlanKind::Logic {
                op: LogicOp::And,
                lhs: Box::new(PlanNode::new(1, PlanKind::Const(Value::Bool(false)))),
                rhs: Box::new(PlanNode::new(2, PlanKind::Const(Value::Bool(true)))),
            },
        );
        let path = ExecutionPath::compile(&node, true);
        assert_eq!(path.len(), 4);
        assert!(matches!(
            path.steps()[1],
            Step::LogicShortCircuit { target: 4, .. }
        ));

        let eager = ExecutionPath::compile(&node, false);
        assert_eq!(eager.len(), 3);
    }

    #[test]
    fn comprehension_layout() {
        let node = PlanNode::new(
            10,
            PlanKind::Comprehension(Box::new(PlannedComprehension {
                iter_var: Arc::from("x"),
                accu_var: Arc::from("acc"),
                iter_range: PlanNode::new(1, PlanKind::CreateList(vec![constant(2, 1)])),
                accu_init: constant(3, 0),
                loop_condition: PlanNode::new(4, PlanKind::Const(Value::Bool(true))),
                loop_step: PlanNode::new(5, PlanKind::Ident(Arc::from("x"))),
                result: PlanNode::new(6, PlanKind::Ident(Arc::from("acc"))),
            })),
        );
        let path = ExecutionPath::compile(&node, true);
        let steps = path.steps();
        // const, list, init, const, acc, next, cond-const, cond, ident, acc, jump,
        // result, ident, finish
        assert_eq!(steps.len(), 14);
        assert!(matches!(steps[2], Step::ComprehensionInit { end: 14, .. }));
        assert!(matches!(steps[5], Step::ComprehensionNext { result: 11 }));
        assert!(matches!(steps[7], Step::ComprehensionCond { result: 11 }));
        assert!(matches!(steps[10], Step::Jump { target: 5 }));
        assert_eq!(steps[13].id(), 10);
        assert_eq!(steps[10].id(), -1);
    }
}
