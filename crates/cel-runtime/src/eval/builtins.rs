//! The standard function library.
//!
//! Builtins are ordinary overloads registered through the registry API;
//! the evaluator has no special knowledge of them apart from the logical
//! operators and the ternary, which the planner lowers to dedicated steps.

use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;

use super::time;
use super::{
    EvalError, FunctionDescriptor, FunctionRegistry, Kind, RegistryError, RuntimeOptions, Value,
};

type UnaryFn = fn(&Value) -> Value;
type BinaryFn = fn(&Value, &Value) -> Value;

fn arity_mismatch(got: usize) -> Value {
    Value::error(EvalError::internal(format!(
        "builtin invoked with {} arguments",
        got
    )))
}

fn unexpected(value: &Value) -> Value {
    Value::error(EvalError::internal(format!(
        "builtin invoked with unexpected {} argument",
        value.kind()
    )))
}

fn unary(
    registry: &mut FunctionRegistry,
    name: &str,
    receiver_style: bool,
    kind: Kind,
    f: UnaryFn,
) -> Result<(), RegistryError> {
    registry.register_fn(
        FunctionDescriptor::new(name, receiver_style, vec![kind]),
        move |args: &[Value]| match args {
            [a] => f(a),
            _ => arity_mismatch(args.len()),
        },
    )
}

fn binary(
    registry: &mut FunctionRegistry,
    name: &str,
    receiver_style: bool,
    kinds: (Kind, Kind),
    f: BinaryFn,
) -> Result<(), RegistryError> {
    registry.register_fn(
        FunctionDescriptor::new(name, receiver_style, vec![kinds.0, kinds.1]),
        move |args: &[Value]| match args {
            [a, b] => f(a, b),
            _ => arity_mismatch(args.len()),
        },
    )
}

/// Register the standard library into `registry`.
pub fn register_builtins(
    registry: &mut FunctionRegistry,
    options: &RuntimeOptions,
) -> Result<(), RegistryError> {
    register_arithmetic(registry)?;
    register_comparisons(registry)?;
    register_equality(registry, options.enable_heterogeneous_equality)?;
    register_logic(registry, options.enable_heterogeneous_equality)?;
    register_strings(registry)?;
    register_conversions(registry)?;
    tracing::debug!(functions = registry.len(), "registered builtin functions");
    Ok(())
}

// ==================== Arithmetic ====================

fn int_arith(a: &Value, b: &Value, op: fn(i64, i64) -> Option<i64>, what: &str) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => op(*x, *y)
            .map(Value::Int)
            .unwrap_or_else(|| Value::error(EvalError::overflow(format!("int64 {} overflow", what)))),
        _ => unexpected(a),
    }
}

fn uint_arith(a: &Value, b: &Value, op: fn(u64, u64) -> Option<u64>, what: &str) -> Value {
    match (a, b) {
        (Value::UInt(x), Value::UInt(y)) => op(*x, *y)
            .map(Value::UInt)
            .unwrap_or_else(|| {
                Value::error(EvalError::overflow(format!("uint64 {} overflow", what)))
            }),
        _ => unexpected(a),
    }
}

fn double_arith(a: &Value, b: &Value, op: fn(f64, f64) -> f64) -> Value {
    match (a, b) {
        (Value::Double(x), Value::Double(y)) => Value::Double(op(*x, *y)),
        _ => unexpected(a),
    }
}

fn time_result<T>(result: Result<T, EvalError>, wrap: fn(T) -> Value) -> Value {
    result.map(wrap).unwrap_or_else(Value::error)
}

fn register_arithmetic(r: &mut FunctionRegistry) -> Result<(), RegistryError> {
    use Kind::*;

    binary(r, "_+_", false, (Int, Int), |a, b| {
        int_arith(a, b, i64::checked_add, "addition")
    })?;
    binary(r, "_+_", false, (UInt, UInt), |a, b| {
        uint_arith(a, b, u64::checked_add, "addition")
    })?;
    binary(r, "_+_", false, (Double, Double), |a, b| {
        double_arith(a, b, |x, y| x + y)
    })?;
    binary(r, "_+_", false, (String, String), |a, b| match (a, b) {
        (Value::String(x), Value::String(y)) => Value::from(format!("{}{}", x, y)),
        _ => unexpected(a),
    })?;
    binary(r, "_+_", false, (Bytes, Bytes), |a, b| match (a, b) {
        (Value::Bytes(x), Value::Bytes(y)) => {
            Value::bytes(x.iter().chain(y.iter()).copied().collect::<Vec<u8>>())
        }
        _ => unexpected(a),
    })?;
    binary(r, "_+_", false, (List, List), |a, b| match (a, b) {
        (Value::List(x), Value::List(y)) => {
            Value::from(x.iter().chain(y.iter()).cloned().collect::<Vec<Value>>())
        }
        _ => unexpected(a),
    })?;
    binary(r, "_+_", false, (Timestamp, Duration), |a, b| match (a, b) {
        (Value::Timestamp(t), Value::Duration(d)) => {
            time_result(time::add_timestamp_duration(t, d), Value::Timestamp)
        }
        _ => unexpected(a),
    })?;
    binary(r, "_+_", false, (Duration, Timestamp), |a, b| match (a, b) {
        (Value::Duration(d), Value::Timestamp(t)) => {
            time_result(time::add_timestamp_duration(t, d), Value::Timestamp)
        }
        _ => unexpected(a),
    })?;
    binary(r, "_+_", false, (Duration, Duration), |a, b| match (a, b) {
        (Value::Duration(x), Value::Duration(y)) => {
            time_result(time::add_durations(x, y), Value::Duration)
        }
        _ => unexpected(a),
    })?;

    binary(r, "_-_", false, (Int, Int), |a, b| {
        int_arith(a, b, i64::checked_sub, "subtraction")
    })?;
    binary(r, "_-_", false, (UInt, UInt), |a, b| {
        uint_arith(a, b, u64::checked_sub, "subtraction")
    })?;
    binary(r, "_-_", false, (Double, Double), |a, b| {
        double_arith(a, b, |x, y| x - y)
    })?;
    binary(r, "_-_", false, (Timestamp, Timestamp), |a, b| match (a, b) {
        (Value::Timestamp(x), Value::Timestamp(y)) => {
            time_result(time::sub_timestamps(x, y), Value::Duration)
        }
        _ => unexpected(a),
    })?;
    binary(r, "_-_", false, (Timestamp, Duration), |a, b| match (a, b) {
        (Value::Timestamp(t), Value::Duration(d)) => {
            time_result(time::sub_timestamp_duration(t, d), Value::Timestamp)
        }
        _ => unexpected(a),
    })?;
    binary(r, "_-_", false, (Duration, Duration), |a, b| match (a, b) {
        (Value::Duration(x), Value::Duration(y)) => {
            time_result(time::sub_durations(x, y), Value::Duration)
        }
        _ => unexpected(a),
    })?;

    binary(r, "_*_", false, (Int, Int), |a, b| {
        int_arith(a, b, i64::checked_mul, "multiplication")
    })?;
    binary(r, "_*_", false, (UInt, UInt), |a, b| {
        uint_arith(a, b, u64::checked_mul, "multiplication")
    })?;
    binary(r, "_*_", false, (Double, Double), |a, b| {
        double_arith(a, b, |x, y| x * y)
    })?;

    binary(r, "_/_", false, (Int, Int), |a, b| match b {
        Value::Int(0) => Value::error(EvalError::division_by_zero()),
        _ => int_arith(a, b, i64::checked_div, "division"),
    })?;
    binary(r, "_/_", false, (UInt, UInt), |a, b| match b {
        Value::UInt(0) => Value::error(EvalError::division_by_zero()),
        _ => uint_arith(a, b, u64::checked_div, "division"),
    })?;
    binary(r, "_/_", false, (Double, Double), |a, b| {
        double_arith(a, b, |x, y| x / y)
    })?;

    binary(r, "_%_", false, (Int, Int), |a, b| match b {
        Value::Int(0) => Value::error(EvalError::modulo_by_zero()),
        _ => int_arith(a, b, i64::checked_rem, "modulus"),
    })?;
    binary(r, "_%_", false, (UInt, UInt), |a, b| match b {
        Value::UInt(0) => Value::error(EvalError::modulo_by_zero()),
        _ => uint_arith(a, b, u64::checked_rem, "modulus"),
    })?;

    unary(r, "-_", false, Int, |v| match v {
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .unwrap_or_else(|| Value::error(EvalError::overflow("int64 negation overflow"))),
        _ => unexpected(v),
    })?;
    unary(r, "-_", false, Double, |v| match v {
        Value::Double(d) => Value::Double(-d),
        _ => unexpected(v),
    })?;
    Ok(())
}

// ==================== Comparison ====================

const ORDERED_KINDS: &[(Kind, Kind)] = &[
    (Kind::Bool, Kind::Bool),
    (Kind::Int, Kind::Int),
    (Kind::UInt, Kind::UInt),
    (Kind::Double, Kind::Double),
    (Kind::String, Kind::String),
    (Kind::Bytes, Kind::Bytes),
    (Kind::Timestamp, Kind::Timestamp),
    (Kind::Duration, Kind::Duration),
    (Kind::Int, Kind::UInt),
    (Kind::Int, Kind::Double),
    (Kind::UInt, Kind::Int),
    (Kind::UInt, Kind::Double),
    (Kind::Double, Kind::Int),
    (Kind::Double, Kind::UInt),
];

fn register_comparisons(r: &mut FunctionRegistry) -> Result<(), RegistryError> {
    let operators: [(&str, fn(Ordering) -> bool); 4] = [
        ("_<_", Ordering::is_lt),
        ("_<=_", Ordering::is_le),
        ("_>_", Ordering::is_gt),
        ("_>=_", Ordering::is_ge),
    ];
    for (name, test) in operators {
        for (a, b) in ORDERED_KINDS {
            r.register_fn(
                FunctionDescriptor::new(name, false, vec![*a, *b]),
                move |args: &[Value]| match args {
                    // NaN is unordered: every comparison is false.
                    [x, y] => Value::Bool(x.compare(y).is_some_and(test)),
                    _ => arity_mismatch(args.len()),
                },
            )?;
        }
    }
    Ok(())
}

// ==================== Equality ====================

const EQUALITY_KINDS: &[Kind] = &[
    Kind::Null,
    Kind::Bool,
    Kind::Int,
    Kind::UInt,
    Kind::Double,
    Kind::String,
    Kind::Bytes,
    Kind::List,
    Kind::Map,
    Kind::Timestamp,
    Kind::Duration,
    Kind::Type,
    Kind::Struct,
];

fn register_equality(r: &mut FunctionRegistry, heterogeneous: bool) -> Result<(), RegistryError> {
    if heterogeneous {
        binary(r, "_==_", false, (Kind::Any, Kind::Any), |a, b| {
            Value::Bool(a.equals(b))
        })?;
        binary(r, "_!=_", false, (Kind::Any, Kind::Any), |a, b| {
            Value::Bool(!a.equals(b))
        })?;
        return Ok(());
    }
    for kind in EQUALITY_KINDS {
        binary(r, "_==_", false, (*kind, *kind), |a, b| Value::Bool(a == b))?;
        binary(r, "_!=_", false, (*kind, *kind), |a, b| Value::Bool(a != b))?;
    }
    Ok(())
}

// ==================== Logic and membership ====================

fn in_list_heterogeneous(needle: &Value, haystack: &Value) -> Value {
    match haystack {
        Value::List(items) => Value::Bool(items.iter().any(|item| item.equals(needle))),
        _ => unexpected(haystack),
    }
}

fn in_list_strict(needle: &Value, haystack: &Value) -> Value {
    match haystack {
        Value::List(items) => Value::Bool(items.iter().any(|item| item == needle)),
        _ => unexpected(haystack),
    }
}

fn in_map(needle: &Value, haystack: &Value) -> Value {
    match haystack {
        Value::Map(map) => Value::Bool(matches!(map.lookup(needle), Ok(Some(_)))),
        _ => unexpected(haystack),
    }
}

fn register_logic(r: &mut FunctionRegistry, heterogeneous: bool) -> Result<(), RegistryError> {
    unary(r, "!_", false, Kind::Bool, |v| match v {
        Value::Bool(b) => Value::Bool(!b),
        _ => unexpected(v),
    })?;

    r.register_fn(
        FunctionDescriptor::new("@not_strictly_false", false, vec![Kind::Any]).non_strict(),
        |args: &[Value]| match args {
            [Value::Bool(b)] => Value::Bool(*b),
            [_] => Value::Bool(true),
            _ => arity_mismatch(args.len()),
        },
    )?;

    let in_list: BinaryFn = if heterogeneous {
        in_list_heterogeneous
    } else {
        in_list_strict
    };
    for name in ["@in", "_in_"] {
        binary(r, name, false, (Kind::Any, Kind::List), in_list)?;
        binary(r, name, false, (Kind::Any, Kind::Map), in_map)?;
    }
    Ok(())
}

// ==================== Strings ====================

fn size_of(v: &Value) -> Value {
    match v {
        Value::String(s) => Value::Int(s.chars().count() as i64),
        Value::Bytes(b) => Value::Int(b.len() as i64),
        Value::List(l) => Value::Int(l.len() as i64),
        Value::Map(m) => Value::Int(m.len() as i64),
        _ => unexpected(v),
    }
}

fn string_test(a: &Value, b: &Value, test: fn(&str, &str) -> bool) -> Value {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Value::Bool(test(x, y)),
        _ => unexpected(a),
    }
}

fn regex_matches(text: &Value, pattern: &Value) -> Value {
    let (Value::String(text), Value::String(pattern)) = (text, pattern) else {
        return unexpected(text);
    };
    match Regex::new(pattern) {
        Ok(re) => Value::Bool(re.is_match(text)),
        Err(e) => Value::error(EvalError::invalid_argument(format!(
            "invalid regular expression '{}': {}",
            pattern, e
        ))),
    }
}

fn register_strings(r: &mut FunctionRegistry) -> Result<(), RegistryError> {
    for kind in [Kind::String, Kind::Bytes, Kind::List, Kind::Map] {
        unary(r, "size", false, kind, size_of)?;
        unary(r, "size", true, kind, size_of)?;
    }
    let receiver = (Kind::String, Kind::String);
    binary(r, "contains", true, receiver, |a, b| {
        string_test(a, b, |x, y| x.contains(y))
    })?;
    binary(r, "startsWith", true, receiver, |a, b| {
        string_test(a, b, |x, y| x.starts_with(y))
    })?;
    binary(r, "endsWith", true, receiver, |a, b| {
        string_test(a, b, |x, y| x.ends_with(y))
    })?;
    binary(r, "matches", true, receiver, regex_matches)?;
    binary(r, "matches", false, receiver, regex_matches)?;
    Ok(())
}

// ==================== Conversions ====================

// Bounds chosen so that every double inside them truncates to a
// representable integer.
const INT_LOWER: f64 = -9_223_372_036_854_775_808.0;
const INT_UPPER: f64 = 9_223_372_036_854_775_808.0;
const UINT_UPPER: f64 = 18_446_744_073_709_551_616.0;

fn register_conversions(r: &mut FunctionRegistry) -> Result<(), RegistryError> {
    use Kind::*;

    unary(r, "int", false, Int, |v| v.clone())?;
    unary(r, "int", false, UInt, |v| match v {
        Value::UInt(u) => i64::try_from(*u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::error(EvalError::range_error("int range error"))),
        _ => unexpected(v),
    })?;
    unary(r, "int", false, Double, |v| match v {
        Value::Double(d) if d.is_finite() && *d > INT_LOWER && *d < INT_UPPER => {
            Value::Int(d.trunc() as i64)
        }
        Value::Double(_) => Value::error(EvalError::range_error("int range error")),
        _ => unexpected(v),
    })?;
    unary(r, "int", false, String, |v| match v {
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::error(EvalError::invalid_conversion(&format!("'{}'", s), "int"))),
        _ => unexpected(v),
    })?;
    unary(r, "int", false, Timestamp, |v| match v {
        Value::Timestamp(t) => Value::Int(t.seconds),
        _ => unexpected(v),
    })?;

    unary(r, "uint", false, UInt, |v| v.clone())?;
    unary(r, "uint", false, Int, |v| match v {
        Value::Int(i) => u64::try_from(*i)
            .map(Value::UInt)
            .unwrap_or_else(|_| Value::error(EvalError::range_error("uint range error"))),
        _ => unexpected(v),
    })?;
    unary(r, "uint", false, Double, |v| match v {
        Value::Double(d) if d.is_finite() && *d > -1.0 && *d < UINT_UPPER => {
            Value::UInt(d.trunc() as u64)
        }
        Value::Double(_) => Value::error(EvalError::range_error("uint range error")),
        _ => unexpected(v),
    })?;
    unary(r, "uint", false, String, |v| match v {
        Value::String(s) => s
            .parse::<u64>()
            .map(Value::UInt)
            .unwrap_or_else(|_| Value::error(EvalError::invalid_conversion(&format!("'{}'", s), "uint"))),
        _ => unexpected(v),
    })?;

    unary(r, "double", false, Double, |v| v.clone())?;
    unary(r, "double", false, Int, |v| match v {
        Value::Int(i) => Value::Double(*i as f64),
        _ => unexpected(v),
    })?;
    unary(r, "double", false, UInt, |v| match v {
        Value::UInt(u) => Value::Double(*u as f64),
        _ => unexpected(v),
    })?;
    unary(r, "double", false, String, |v| match v {
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::Double)
            .unwrap_or_else(|_| Value::error(EvalError::invalid_conversion(&format!("'{}'", s), "double"))),
        _ => unexpected(v),
    })?;

    unary(r, "string", false, String, |v| v.clone())?;
    unary(r, "string", false, Bool, |v| match v {
        Value::Bool(b) => Value::from(b.to_string()),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, Int, |v| match v {
        Value::Int(i) => Value::from(i.to_string()),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, UInt, |v| match v {
        Value::UInt(u) => Value::from(u.to_string()),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, Double, |v| match v {
        Value::Double(d) => Value::from(d.to_string()),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, Bytes, |v| match v {
        Value::Bytes(b) => std::str::from_utf8(b)
            .map(Value::from)
            .unwrap_or_else(|_| Value::error(EvalError::invalid_conversion("bytes", "string"))),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, Timestamp, |v| match v {
        Value::Timestamp(t) => Value::from(time::format_timestamp(t)),
        _ => unexpected(v),
    })?;
    unary(r, "string", false, Duration, |v| match v {
        Value::Duration(d) => Value::from(time::format_duration(d)),
        _ => unexpected(v),
    })?;

    unary(r, "bytes", false, Bytes, |v| v.clone())?;
    unary(r, "bytes", false, String, |v| match v {
        Value::String(s) => Value::Bytes(Arc::from(s.as_bytes())),
        _ => unexpected(v),
    })?;

    unary(r, "bool", false, Bool, |v| v.clone())?;
    unary(r, "bool", false, String, |v| match v {
        Value::String(s) => match &**s {
            "1" | "t" | "true" | "TRUE" | "True" => Value::Bool(true),
            "0" | "f" | "false" | "FALSE" | "False" => Value::Bool(false),
            other => Value::error(EvalError::invalid_conversion(&format!("'{}'", other), "bool")),
        },
        _ => unexpected(v),
    })?;

    unary(r, "duration", false, Duration, |v| v.clone())?;
    unary(r, "duration", false, String, |v| match v {
        Value::String(s) => time_result(time::parse_duration(s), Value::Duration),
        _ => unexpected(v),
    })?;

    unary(r, "timestamp", false, Timestamp, |v| v.clone())?;
    unary(r, "timestamp", false, String, |v| match v {
        Value::String(s) => time_result(time::parse_timestamp(s), Value::Timestamp),
        _ => unexpected(v),
    })?;
    unary(r, "timestamp", false, Int, |v| match v {
        Value::Int(i) => {
            let ts = super::Timestamp::from_seconds(*i);
            if ts.is_valid() {
                Value::Timestamp(ts)
            } else {
                Value::error(EvalError::range_error("timestamp out of range"))
            }
        }
        _ => unexpected(v),
    })?;

    unary(r, "type", false, Any, |v| Value::Type(v.type_value()))?;
    unary(r, "dyn", false, Any, |v| v.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Code;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        register_builtins(&mut registry, &RuntimeOptions::default()).unwrap();
        registry
    }

    fn call(registry: &FunctionRegistry, name: &str, args: &[Value]) -> Value {
        let kinds: Vec<Kind> = args.iter().map(Value::kind).collect();
        let overloads = registry.find_static_overloads(name, false, &kinds);
        let overload = overloads.first().expect("overload");
        overload.call(args).unwrap()
    }

    #[test]
    fn int_overflow_and_division_by_zero_differ() {
        let r = registry();
        let overflow = call(&r, "_+_", &[Value::Int(i64::MAX), Value::Int(1)]);
        assert_eq!(overflow.as_error().unwrap().code, Code::OutOfRange);
        let div = call(&r, "_/_", &[Value::Int(1), Value::Int(0)]);
        assert_eq!(div.as_error().unwrap().code, Code::InvalidArgument);
        let min_div = call(&r, "_/_", &[Value::Int(i64::MIN), Value::Int(-1)]);
        assert_eq!(min_div.as_error().unwrap().code, Code::OutOfRange);
        let modulo = call(&r, "_%_", &[Value::Int(1), Value::Int(0)]);
        assert_eq!(modulo.as_error().unwrap().code, Code::InvalidArgument);
    }

    #[test]
    fn uint_overflow() {
        let r = registry();
        let v = call(&r, "_-_", &[Value::UInt(0), Value::UInt(1)]);
        assert_eq!(v.as_error().unwrap().code, Code::OutOfRange);
        assert_eq!(
            call(&r, "_*_", &[Value::UInt(3), Value::UInt(4)]),
            Value::UInt(12)
        );
    }

    #[test]
    fn cross_numeric_comparison() {
        let r = registry();
        assert_eq!(
            call(&r, "_<_", &[Value::Int(-1), Value::UInt(0)]),
            Value::Bool(true)
        );
        assert_eq!(
            call(&r, "_>=_", &[Value::Double(f64::NAN), Value::Double(1.0)]),
            Value::Bool(false)
        );
    }

    #[test]
    fn equality_modes() {
        let r = registry();
        assert_eq!(
            call(&r, "_==_", &[Value::Int(1), Value::UInt(1)]),
            Value::Bool(true)
        );

        let mut strict = FunctionRegistry::new();
        let options = RuntimeOptions::default().with_heterogeneous_equality(false);
        register_builtins(&mut strict, &options).unwrap();
        assert!(strict
            .find_static_overloads("_==_", false, &[Kind::Int, Kind::UInt])
            .is_empty());
    }

    #[test]
    fn not_strictly_false() {
        let r = registry();
        let err = Value::error(EvalError::division_by_zero());
        assert_eq!(call(&r, "@not_strictly_false", &[err]), Value::Bool(true));
        assert_eq!(
            call(&r, "@not_strictly_false", &[Value::Bool(false)]),
            Value::Bool(false)
        );
    }

    #[test]
    fn membership() {
        let r = registry();
        let list = Value::from(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(call(&r, "@in", &[Value::UInt(2), list]), Value::Bool(true));
    }

    #[test]
    fn conversions() {
        let r = registry();
        assert_eq!(call(&r, "int", &[Value::from("42")]), Value::Int(42));
        assert_eq!(
            call(&r, "int", &[Value::from("x")]).as_error().unwrap().code,
            Code::InvalidArgument
        );
        assert_eq!(
            call(&r, "int", &[Value::Double(1e19)]).as_error().unwrap().code,
            Code::OutOfRange
        );
        assert_eq!(
            call(&r, "uint", &[Value::Int(-1)]).as_error().unwrap().code,
            Code::OutOfRange
        );
        assert_eq!(
            call(&r, "duration", &[Value::from("1h")]),
            Value::duration(3600, 0)
        );
        assert_eq!(
            call(&r, "type", &[Value::Int(1)]),
            Value::new_type("int")
        );
        assert_eq!(call(&r, "string", &[Value::UInt(7)]), Value::from("7"));
    }

    #[test]
    fn string_functions() {
        let r = registry();
        assert_eq!(call(&r, "size", &[Value::from("héllo")]), Value::Int(5));
        let matches = r.find_static_overloads("matches", true, &[Kind::String, Kind::String]);
        assert_eq!(
            matches[0]
                .call(&[Value::from("abc123"), Value::from("^[a-z]+[0-9]+$")])
                .unwrap(),
            Value::Bool(true)
        );
        assert!(matches[0]
            .call(&[Value::from("abc"), Value::from("(")])
            .unwrap()
            .is_error());
    }
}
