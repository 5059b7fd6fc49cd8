//! Property tests for name resolution, unknown-set algebra, and evaluation.
//!
//! Properties checked:
//!
//! 1. A relative name in a container of depth `n` has `n + 1` candidates,
//!    most specific first; an absolute name has exactly one.
//! 2. Unknown-set union is commutative, associative, and idempotent.
//! 3. Aggregates report the first error in argument order, otherwise the
//!    union of all unknowns.
//! 4. Integer arithmetic matches a checked reference, and the iterative and
//!    recursive evaluators always agree.

mod common;

use proptest::prelude::*;

use cel_runtime::ast::{Expr, ExprBuilder};
use cel_runtime::eval::{
    Attribute, FunctionRegistry, MapActivation, Resolver, StaticTypeProvider, UnknownSet,
};
use cel_runtime::{AttributePattern, Code, Runtime, RuntimeOptions, UnknownProcessing, Value};
use common::eval_with;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const NAME_POOL: &[&str] = &["a", "b", "c", "pkg", "api", "expr", "x", "y"];
const UNKNOWN_VARS: &[&str] = &["u", "v", "w"];
const INT_OPS: &[&str] = &["_+_", "_-_", "_*_", "_/_", "_%_"];

fn arb_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(NAME_POOL)
}

fn arb_container() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(arb_name(), 0..5)
}

fn arb_attribute() -> impl Strategy<Value = Attribute> {
    (arb_name(), prop::collection::vec(arb_name(), 0..3)).prop_map(|(root, fields)| {
        fields
            .into_iter()
            .fold(Attribute::new(root), |attr, field| attr.field(field))
    })
}

fn arb_unknown_set() -> impl Strategy<Value = UnknownSet> {
    prop::collection::vec(arb_attribute(), 0..4).prop_map(|attrs| {
        attrs
            .into_iter()
            .fold(UnknownSet::new(), |set, attr| {
                set.merge(&UnknownSet::from_attribute(attr))
            })
    })
}

/// One element of a list literal.
#[derive(Debug, Clone)]
enum Element {
    Int(i64),
    DivideByZero,
    ModulusByZero,
    Unknown(&'static str),
}

fn arb_element() -> impl Strategy<Value = Element> {
    prop_oneof![
        4 => any::<i64>().prop_map(Element::Int),
        1 => Just(Element::DivideByZero),
        1 => Just(Element::ModulusByZero),
        2 => prop::sample::select(UNKNOWN_VARS).prop_map(Element::Unknown),
    ]
}

impl Element {
    fn build(&self, b: &ExprBuilder) -> Expr {
        match self {
            Element::Int(i) => b.int(*i),
            Element::DivideByZero => b.call("_/_", vec![b.int(1), b.int(0)]),
            Element::ModulusByZero => b.call("_%_", vec![b.int(1), b.int(0)]),
            Element::Unknown(name) => b.ident(name),
        }
    }
}

/// Integer arithmetic over literals and the variable `x`.
#[derive(Debug, Clone)]
enum Arith {
    Lit(i64),
    Var,
    Bin(&'static str, Box<Arith>, Box<Arith>),
}

fn arb_arith() -> impl Strategy<Value = Arith> {
    let leaf = prop_oneof![
        prop_oneof![any::<i64>(), -10i64..10].prop_map(Arith::Lit),
        Just(Arith::Var),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        (
            prop::sample::select(INT_OPS),
            inner.clone(),
            inner,
        )
            .prop_map(|(op, lhs, rhs)| Arith::Bin(op, Box::new(lhs), Box::new(rhs)))
    })
}

impl Arith {
    fn build(&self, b: &ExprBuilder) -> Expr {
        match self {
            Arith::Lit(i) => b.int(*i),
            Arith::Var => b.ident("x"),
            Arith::Bin(op, lhs, rhs) => b.call(op, vec![lhs.build(b), rhs.build(b)]),
        }
    }

    /// Checked reference semantics: the first failing operand wins.
    fn reference(&self, x: i64) -> Result<i64, Code> {
        match self {
            Arith::Lit(i) => Ok(*i),
            Arith::Var => Ok(x),
            Arith::Bin(op, lhs, rhs) => {
                let a = lhs.reference(x)?;
                let b = rhs.reference(x)?;
                let checked = match *op {
                    "_+_" => a.checked_add(b),
                    "_-_" => a.checked_sub(b),
                    "_*_" => a.checked_mul(b),
                    "_/_" if b == 0 => return Err(Code::InvalidArgument),
                    "_/_" => a.checked_div(b),
                    "_%_" if b == 0 => return Err(Code::InvalidArgument),
                    _ => a.checked_rem(b),
                };
                checked.ok_or(Code::OutOfRange)
            }
        }
    }
}

fn unknown_runtime() -> Runtime {
    Runtime::new(
        RuntimeOptions::default().with_unknown_processing(UnknownProcessing::AttributeOnly),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn candidate_names_shrink_from_the_full_container(
        segments in arb_container(),
        name in arb_name(),
    ) {
        let container = segments.join(".");
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new();
        let resolver = Resolver::new(&container, &registry, &provider, false);

        let names = resolver.fully_qualified_names(name);
        prop_assert_eq!(names.len(), segments.len() + 1);
        prop_assert_eq!(names.last().map(String::as_str), Some(name));
        for (i, candidate) in names.iter().enumerate() {
            let depth = segments.len() - i;
            let prefix = segments[..depth].join(".");
            let expected = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            };
            prop_assert_eq!(candidate, &expected);
        }

        let absolute = resolver.fully_qualified_names(&format!(".{}", name));
        prop_assert_eq!(absolute, vec![name.to_string()]);
    }
}

// ---------------------------------------------------------------------------
// Unknown sets
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn unknown_merge_is_commutative(a in arb_unknown_set(), b in arb_unknown_set()) {
        prop_assert_eq!(a.merge(&b), b.merge(&a));
    }

    #[test]
    fn unknown_merge_is_associative(
        a in arb_unknown_set(),
        b in arb_unknown_set(),
        c in arb_unknown_set(),
    ) {
        prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn unknown_merge_is_idempotent(a in arb_unknown_set()) {
        let merged = a.merge(&a);
        prop_assert_eq!(merged.len(), a.len());
        prop_assert_eq!(merged, a);
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aggregates_prefer_first_error_then_unknowns(
        elements in prop::collection::vec(arb_element(), 0..6),
    ) {
        let runtime = unknown_runtime();
        let activation = MapActivation::new()
            .with_unknown_pattern(AttributePattern::new(UNKNOWN_VARS[0]))
            .with_unknown_pattern(AttributePattern::new(UNKNOWN_VARS[1]))
            .with_unknown_pattern(AttributePattern::new(UNKNOWN_VARS[2]));
        let b = ExprBuilder::new();
        let expr = b.list(elements.iter().map(|e| e.build(&b)).collect());
        let result = eval_with(&runtime, &expr, &activation);

        let first_error = elements.iter().find_map(|e| match e {
            Element::DivideByZero => Some("divide by zero"),
            Element::ModulusByZero => Some("modulus by zero"),
            _ => None,
        });
        let unknowns: Vec<&str> = elements
            .iter()
            .filter_map(|e| match e {
                Element::Unknown(name) => Some(*name),
                _ => None,
            })
            .collect();

        if let Some(message) = first_error {
            let err = result.as_error();
            prop_assert!(err.is_some(), "expected error, got {}", result);
            prop_assert_eq!(err.map(|e| e.message.as_str()), Some(message));
        } else if !unknowns.is_empty() {
            let expected = unknowns.iter().fold(UnknownSet::new(), |set, name| {
                set.merge(&UnknownSet::from_attribute(Attribute::new(*name)))
            });
            prop_assert_eq!(result, Value::unknown(expected));
        } else {
            let expected: Vec<Value> = elements
                .iter()
                .filter_map(|e| match e {
                    Element::Int(i) => Some(Value::Int(*i)),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(result, Value::from(expected));
        }
    }

    #[test]
    fn arithmetic_matches_checked_reference(tree in arb_arith(), x in any::<i64>()) {
        let runtime = Runtime::new(RuntimeOptions::default()).unwrap();
        let b = ExprBuilder::new();
        let expr = tree.build(&b);
        let activation = MapActivation::new().with_binding("x", x);
        let result = eval_with(&runtime, &expr, &activation);

        match tree.reference(x) {
            Ok(expected) => prop_assert_eq!(result, Value::Int(expected)),
            Err(code) => {
                prop_assert_eq!(result.as_error().map(|e| e.code), Some(code));
            }
        }
    }
}
