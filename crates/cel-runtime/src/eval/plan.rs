//! The planned program tree.
//!
//! A `PlanNode` tree is an expression tree whose names and overloads have
//! already been resolved. The recursive evaluator walks it directly; the
//! iterative evaluator runs the flat [`ExecutionPath`](super::ExecutionPath)
//! compiled from it.

use std::fmt;
use std::sync::Arc;

use super::{FunctionDescriptor, Overload, Value};

/// The candidates bound to one call site at plan time.
#[derive(Debug, Clone)]
pub struct CallTarget {
    /// The function name as written at the call site.
    pub name: String,
    pub receiver_style: bool,
    /// Argument count, receiver included.
    pub arity: usize,
    /// Static overloads in resolution order.
    pub overloads: Vec<Overload>,
    /// Lazy descriptors bound against the activation when the call runs.
    pub lazy: Vec<FunctionDescriptor>,
}

impl CallTarget {
    /// Strict unless a non-strict overload was bound.
    ///
    /// Registration keeps a non-strict overload alone under its name, so a
    /// single non-strict candidate decides for the whole call.
    pub fn is_strict(&self) -> bool {
        self.overloads.iter().all(|o| o.descriptor.is_strict)
            && self.lazy.iter().all(|d| d.is_strict)
    }

    /// True if no overload of any kind was found.
    pub fn is_unbound(&self) -> bool {
        self.overloads.is_empty() && self.lazy.is_empty()
    }
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    /// The operand value that decides the result on its own.
    pub fn short_circuit_value(&self) -> bool {
        matches!(self, LogicOp::Or)
    }

    pub fn function_name(&self) -> &'static str {
        match self {
            LogicOp::And => "_&&_",
            LogicOp::Or => "_||_",
        }
    }
}

/// A planned expression node.
#[derive(Debug, Clone)]
pub struct PlanNode {
    /// Id of the originating expression node.
    pub id: i64,
    pub kind: PlanKind,
}

#[derive(Debug, Clone)]
pub enum PlanKind {
    Const(Value),
    /// A variable: a comprehension local or an activation binding.
    Ident(Arc<str>),
    Select {
        operand: Box<PlanNode>,
        field: Arc<str>,
        test_only: bool,
    },
    Index {
        operand: Box<PlanNode>,
        index: Box<PlanNode>,
    },
    /// A function call; for receiver-style calls the receiver is `args[0]`.
    Call {
        target: Arc<CallTarget>,
        args: Vec<PlanNode>,
    },
    Logic {
        op: LogicOp,
        lhs: Box<PlanNode>,
        rhs: Box<PlanNode>,
    },
    Ternary {
        condition: Box<PlanNode>,
        then_branch: Box<PlanNode>,
        else_branch: Box<PlanNode>,
    },
    CreateList(Vec<PlanNode>),
    CreateMap(Vec<(PlanNode, PlanNode)>),
    CreateStruct {
        type_name: Arc<str>,
        fields: Vec<(Arc<str>, PlanNode)>,
    },
    Comprehension(Box<PlannedComprehension>),
}

/// The parts of a planned fold.
#[derive(Debug, Clone)]
pub struct PlannedComprehension {
    pub iter_var: Arc<str>,
    pub accu_var: Arc<str>,
    pub iter_range: PlanNode,
    pub accu_init: PlanNode,
    pub loop_condition: PlanNode,
    pub loop_step: PlanNode,
    pub result: PlanNode,
}

impl PlanNode {
    pub fn new(id: i64, kind: PlanKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PlanKind::Const(v) => write!(f, "{}", v),
            PlanKind::Ident(name) => write!(f, "{}", name),
            PlanKind::Select {
                operand,
                field,
                test_only,
            } => {
                if *test_only {
                    write!(f, "has({}.{})", operand, field)
                } else {
                    write!(f, "{}.{}", operand, field)
                }
            }
            PlanKind::Index { operand, index } => write!(f, "{}[{}]", operand, index),
            PlanKind::Call { target, args } => {
                write!(f, "{}(", target.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            PlanKind::Logic { op, lhs, rhs } => {
                let symbol = match op {
                    LogicOp::And => "&&",
                    LogicOp::Or => "||",
                };
                write!(f, "({} {} {})", lhs, symbol, rhs)
            }
            PlanKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            PlanKind::CreateList(elements) => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            PlanKind::CreateMap(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            PlanKind::CreateStruct { type_name, fields } => {
                write!(f, "{}{{", type_name)?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, v)?;
                }
                write!(f, "}}")
            }
            PlanKind::Comprehension(c) => write!(
                f,
                "fold({}, {} in {}; {})",
                c.accu_var, c.iter_var, c.iter_range, c.result
            ),
        }
    }
}
