//! Expression trees consumed by the planner.
//!
//! The tree is the macro-expanded form produced by a CEL parser: operators
//! are calls to functions such as `_+_` or `_&&_`, and macros such as
//! `exists` are already lowered to [`Comprehension`] nodes. Every node carries
//! an id that is unique within its tree.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::eval::Value;

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Constant {
    /// The runtime value of this constant.
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::UInt(u) => Value::UInt(*u),
            Constant::Double(d) => Value::Double(*d),
            Constant::String(s) => Value::String(Arc::from(s.as_str())),
            Constant::Bytes(b) => Value::Bytes(Arc::from(b.as_slice())),
        }
    }
}

/// An expression node with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: i64,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: i64, kind: ExprKind) -> Self {
        Self { id, kind }
    }
}

/// The expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(Constant),
    /// A possibly qualified identifier; `.name` is absolute.
    Ident(String),
    /// Field selection, or a presence test (`has(a.b)`) when `test_only`.
    Select {
        operand: Box<Expr>,
        field: String,
        test_only: bool,
    },
    /// A global call when `target` is `None`, a receiver call otherwise.
    Call {
        target: Option<Box<Expr>>,
        function: String,
        args: Vec<Expr>,
    },
    CreateList(Vec<Expr>),
    CreateStruct {
        message_name: String,
        fields: Vec<StructField>,
    },
    CreateMap(Vec<MapEntry>),
    Comprehension(Box<Comprehension>),
}

/// A field initializer in a struct literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub id: i64,
    pub field: String,
    pub value: Expr,
}

/// A key/value entry in a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub id: i64,
    pub key: Expr,
    pub value: Expr,
}

/// A fold over a list or map.
///
/// ```text
/// let accu_var = accu_init
/// for iter_var in iter_range {
///    if (!loop_condition) { break }
///    accu_var = loop_step
/// }
/// return result
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Expr,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

/// A reference recorded by a type checker for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Fully qualified name of the referenced identifier.
    pub name: String,
    /// Constant value, set for enum constants.
    pub value: Option<Value>,
}

impl Reference {
    pub fn ident(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }
}

/// Node id to reference, as produced by a type checker.
pub type ReferenceMap = HashMap<i64, Reference>;

/// Builds expression trees with sequential node ids.
///
/// ```
/// use cel_runtime::ast::ExprBuilder;
///
/// let b = ExprBuilder::new();
/// let sum = b.call("_+_", vec![b.int(1), b.int(2)]);
/// assert_eq!(sum.id, 3);
/// ```
#[derive(Debug)]
pub struct ExprBuilder {
    next_id: Cell<i64>,
}

impl Default for ExprBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprBuilder {
    /// Create a builder whose first node id is 1.
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(self.next_id(), kind)
    }

    pub fn constant(&self, constant: Constant) -> Expr {
        self.expr(ExprKind::Const(constant))
    }

    pub fn null(&self) -> Expr {
        self.constant(Constant::Null)
    }

    pub fn bool(&self, value: bool) -> Expr {
        self.constant(Constant::Bool(value))
    }

    pub fn int(&self, value: i64) -> Expr {
        self.constant(Constant::Int(value))
    }

    pub fn uint(&self, value: u64) -> Expr {
        self.constant(Constant::UInt(value))
    }

    pub fn double(&self, value: f64) -> Expr {
        self.constant(Constant::Double(value))
    }

    pub fn string(&self, value: &str) -> Expr {
        self.constant(Constant::String(value.to_string()))
    }

    pub fn bytes(&self, value: &[u8]) -> Expr {
        self.constant(Constant::Bytes(value.to_vec()))
    }

    pub fn ident(&self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(name.to_string()))
    }

    pub fn select(&self, operand: Expr, field: &str) -> Expr {
        self.expr(ExprKind::Select {
            operand: Box::new(operand),
            field: field.to_string(),
            test_only: false,
        })
    }

    /// A presence test, the lowered form of `has(operand.field)`.
    pub fn has(&self, operand: Expr, field: &str) -> Expr {
        self.expr(ExprKind::Select {
            operand: Box::new(operand),
            field: field.to_string(),
            test_only: true,
        })
    }

    pub fn call(&self, function: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            target: None,
            function: function.to_string(),
            args,
        })
    }

    pub fn member_call(&self, target: Expr, function: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            target: Some(Box::new(target)),
            function: function.to_string(),
            args,
        })
    }

    pub fn list(&self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::CreateList(elements))
    }

    pub fn map(&self, entries: Vec<(Expr, Expr)>) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| MapEntry {
                id: self.next_id(),
                key,
                value,
            })
            .collect();
        self.expr(ExprKind::CreateMap(entries))
    }

    pub fn create_struct(&self, message_name: &str, fields: Vec<(&str, Expr)>) -> Expr {
        let fields = fields
            .into_iter()
            .map(|(field, value)| StructField {
                id: self.next_id(),
                field: field.to_string(),
                value,
            })
            .collect();
        self.expr(ExprKind::CreateStruct {
            message_name: message_name.to_string(),
            fields,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn comprehension(
        &self,
        iter_var: &str,
        iter_range: Expr,
        accu_var: &str,
        accu_init: Expr,
        loop_condition: Expr,
        loop_step: Expr,
        result: Expr,
    ) -> Expr {
        self.expr(ExprKind::Comprehension(Box::new(Comprehension {
            iter_var: iter_var.to_string(),
            iter_range,
            accu_var: accu_var.to_string(),
            accu_init,
            loop_condition,
            loop_step,
            result,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_sequential_ids() {
        let b = ExprBuilder::new();
        let expr = b.call("_+_", vec![b.int(1), b.int(2)]);
        assert_eq!(expr.id, 3);
        let ExprKind::Call { args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args[0].id, 1);
        assert_eq!(args[1].id, 2);
    }

    #[test]
    fn constants_convert_to_values() {
        assert_eq!(Constant::Int(3).to_value(), Value::Int(3));
        assert_eq!(Constant::String("a".into()).to_value(), Value::from("a"));
        assert_eq!(Constant::Null.to_value(), Value::Null);
    }
}
