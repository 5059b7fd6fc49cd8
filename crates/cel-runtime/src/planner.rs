//! Expression tree to plan compilation.
//!
//! The planner resolves everything that does not depend on the activation:
//! comprehension locals, enum constants and type names, namespaced function
//! names, and the overload candidates of every call site. The resulting
//! [`PlanNode`] tree is what both evaluators run.

use std::sync::Arc;

use crate::ast::{Comprehension, Expr, ExprKind, ReferenceMap};
use crate::eval::{
    CallTarget, Kind, LogicOp, PlanError, PlanKind, PlanNode, PlannedComprehension, Resolver,
    RuntimeOptions,
};

pub(crate) struct Planner<'a> {
    resolver: Resolver<'a>,
    references: Option<&'a ReferenceMap>,
    max_depth: usize,
    depth: usize,
    locals: Vec<Arc<str>>,
    warnings: Vec<String>,
}

impl<'a> Planner<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        options: &RuntimeOptions,
        references: Option<&'a ReferenceMap>,
    ) -> Self {
        Self {
            resolver,
            references,
            max_depth: options.max_recursion_depth,
            depth: 0,
            locals: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Plan `expr`, returning the tree and the warnings collected on the way.
    pub fn plan(mut self, expr: &Expr) -> Result<(PlanNode, Vec<String>), PlanError> {
        let node = self.plan_expr(expr)?;
        Ok((node, self.warnings))
    }

    fn plan_expr(&mut self, expr: &Expr) -> Result<PlanNode, PlanError> {
        if self.depth >= self.max_depth {
            return Err(PlanError::RecursionLimit(self.max_depth));
        }
        self.depth += 1;
        let node = self.plan_kind(expr);
        self.depth -= 1;
        node
    }

    fn plan_kind(&mut self, expr: &Expr) -> Result<PlanNode, PlanError> {
        let id = expr.id;
        if let Some(node) = self.plan_reference(expr) {
            return Ok(node);
        }
        let kind = match &expr.kind {
            ExprKind::Const(constant) => PlanKind::Const(constant.to_value()),
            ExprKind::Ident(name) => return self.plan_ident(id, name),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => {
                if !test_only {
                    if let Some(node) = self.plan_qualified_constant(expr) {
                        return Ok(node);
                    }
                }
                PlanKind::Select {
                    operand: Box::new(self.plan_expr(operand)?),
                    field: Arc::from(field.as_str()),
                    test_only: *test_only,
                }
            }
            ExprKind::Call {
                target,
                function,
                args,
            } => return self.plan_call(id, target.as_deref(), function, args),
            ExprKind::CreateList(elements) => PlanKind::CreateList(
                elements
                    .iter()
                    .map(|e| self.plan_expr(e))
                    .collect::<Result<_, _>>()?,
            ),
            ExprKind::CreateMap(entries) => {
                let mut planned = Vec::with_capacity(entries.len());
                for entry in entries {
                    planned.push((self.plan_expr(&entry.key)?, self.plan_expr(&entry.value)?));
                }
                PlanKind::CreateMap(planned)
            }
            ExprKind::CreateStruct {
                message_name,
                fields,
            } => {
                let Some((type_name, _)) = self.resolver.find_type(message_name, id)? else {
                    return Err(PlanError::Unsupported {
                        id,
                        reason: format!("unknown message type '{}'", message_name),
                    });
                };
                let mut planned = Vec::with_capacity(fields.len());
                for field in fields {
                    planned.push((
                        Arc::from(field.field.as_str()),
                        self.plan_expr(&field.value)?,
                    ));
                }
                PlanKind::CreateStruct {
                    type_name: Arc::from(type_name.as_str()),
                    fields: planned,
                }
            }
            ExprKind::Comprehension(c) => self.plan_comprehension(id, c)?,
        };
        Ok(PlanNode::new(id, kind))
    }

    /// Checked trees record what an identifier or select chain refers to.
    fn plan_reference(&self, expr: &Expr) -> Option<PlanNode> {
        if !matches!(
            expr.kind,
            ExprKind::Ident(_) | ExprKind::Select { test_only: false, .. }
        ) {
            return None;
        }
        let reference = self.references?.get(&expr.id)?;
        let kind = match &reference.value {
            Some(value) => PlanKind::Const(value.clone()),
            None => PlanKind::Ident(Arc::from(reference.name.trim_start_matches('.'))),
        };
        Some(PlanNode::new(expr.id, kind))
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|l| &**l == name)
    }

    fn plan_ident(&mut self, id: i64, name: &str) -> Result<PlanNode, PlanError> {
        if name.is_empty() || name == "." {
            return Err(PlanError::Unsupported {
                id,
                reason: "empty identifier".to_string(),
            });
        }
        if self.is_local(name) {
            return Ok(PlanNode::new(id, PlanKind::Ident(Arc::from(name))));
        }
        if let Some(value) = self.resolver.find_constant(name, id) {
            tracing::debug!(expr_id = id, name, "identifier resolved to constant");
            return Ok(PlanNode::new(id, PlanKind::Const(value)));
        }
        Ok(PlanNode::new(
            id,
            PlanKind::Ident(Arc::from(name.trim_start_matches('.'))),
        ))
    }

    /// Resolve a whole `a.b.c` chain as an enum constant or type name.
    ///
    /// Shorter prefixes are tried as the operand is planned, so the longest
    /// resolvable name wins.
    fn plan_qualified_constant(&self, expr: &Expr) -> Option<PlanNode> {
        let (root, name) = qualified_name(expr)?;
        if self.is_local(root) {
            return None;
        }
        let value = self.resolver.find_constant(&name, expr.id)?;
        tracing::debug!(expr_id = expr.id, name = %name, "select chain resolved to constant");
        Some(PlanNode::new(expr.id, PlanKind::Const(value)))
    }

    fn plan_call(
        &mut self,
        id: i64,
        target: Option<&Expr>,
        function: &str,
        args: &[Expr],
    ) -> Result<PlanNode, PlanError> {
        if target.is_none() {
            match (function, args) {
                ("_&&_", [lhs, rhs]) => return self.plan_logic(id, LogicOp::And, lhs, rhs),
                ("_||_", [lhs, rhs]) => return self.plan_logic(id, LogicOp::Or, lhs, rhs),
                ("_?_:_", [condition, then_branch, else_branch]) => {
                    let kind = PlanKind::Ternary {
                        condition: Box::new(self.plan_expr(condition)?),
                        then_branch: Box::new(self.plan_expr(then_branch)?),
                        else_branch: Box::new(self.plan_expr(else_branch)?),
                    };
                    return Ok(PlanNode::new(id, kind));
                }
                ("_[_]", [operand, index]) => {
                    let kind = PlanKind::Index {
                        operand: Box::new(self.plan_expr(operand)?),
                        index: Box::new(self.plan_expr(index)?),
                    };
                    return Ok(PlanNode::new(id, kind));
                }
                _ => {}
            }
        }

        // `a.b.f(x)` is a call to the namespaced function `a.b.f` when one
        // is registered and `a` is not a local.
        let namespaced = target.and_then(|t| {
            let (root, qualifier) = qualified_name(t)?;
            if self.is_local(root) {
                return None;
            }
            let name = format!("{}.{}", qualifier, function);
            self.resolver.is_function(&name).then_some(name)
        });
        let (name, receiver) = match namespaced {
            Some(name) => (name, None),
            None => (function.to_string(), target),
        };

        let mut planned = Vec::with_capacity(args.len() + 1);
        if let Some(receiver) = receiver {
            planned.push(self.plan_expr(receiver)?);
        }
        for arg in args {
            planned.push(self.plan_expr(arg)?);
        }

        let receiver_style = receiver.is_some();
        let kinds = vec![Kind::Any; planned.len()];
        let call = CallTarget {
            overloads: self
                .resolver
                .find_overloads(&name, receiver_style, &kinds)
                .into_iter()
                .cloned()
                .collect(),
            lazy: self
                .resolver
                .find_lazy_overloads(&name, receiver_style, &kinds)
                .into_iter()
                .cloned()
                .collect(),
            name,
            receiver_style,
            arity: planned.len(),
        };
        if call.is_unbound() {
            let warning = format!(
                "no overloads registered for function '{}' with {} arguments",
                call.name, call.arity
            );
            tracing::warn!(expr_id = id, function = %call.name, "{}", warning);
            self.warnings.push(warning);
        }
        Ok(PlanNode::new(
            id,
            PlanKind::Call {
                target: Arc::new(call),
                args: planned,
            },
        ))
    }

    fn plan_logic(
        &mut self,
        id: i64,
        op: LogicOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<PlanNode, PlanError> {
        let kind = PlanKind::Logic {
            op,
            lhs: Box::new(self.plan_expr(lhs)?),
            rhs: Box::new(self.plan_expr(rhs)?),
        };
        Ok(PlanNode::new(id, kind))
    }

    fn plan_comprehension(&mut self, id: i64, c: &Comprehension) -> Result<PlanKind, PlanError> {
        if c.iter_var.is_empty() || c.accu_var.is_empty() {
            return Err(PlanError::Unsupported {
                id,
                reason: "comprehension without loop variables".to_string(),
            });
        }
        let iter_var: Arc<str> = Arc::from(c.iter_var.as_str());
        let accu_var: Arc<str> = Arc::from(c.accu_var.as_str());

        let iter_range = self.plan_expr(&c.iter_range)?;
        let accu_init = self.plan_expr(&c.accu_init)?;

        let outer = self.locals.len();
        self.locals.push(accu_var.clone());
        self.locals.push(iter_var.clone());
        let loop_condition = self.plan_expr(&c.loop_condition)?;
        let loop_step = self.plan_expr(&c.loop_step)?;
        // The iteration variable is unbound while the result is computed.
        self.locals.pop();
        let result = self.plan_expr(&c.result)?;
        self.locals.truncate(outer);

        Ok(PlanKind::Comprehension(Box::new(PlannedComprehension {
            iter_var,
            accu_var,
            iter_range,
            accu_init,
            loop_condition,
            loop_step,
            result,
        })))
    }
}

/// The dotted name of an identifier or select chain, with its root variable.
fn qualified_name(expr: &Expr) -> Option<(&str, String)> {
    match &expr.kind {
        ExprKind::Ident(name) => Some((name.as_str(), name.clone())),
        ExprKind::Select {
            operand,
            field,
            test_only: false,
        } => {
            let (root, prefix) = qualified_name(operand)?;
            Some((root, format!("{}.{}", prefix, field)))
        }
        _ => None,
    }
}
