//! The value model: scalars, collections, time values, types, external
//! records, and the in-band `Error` and `Unknown` signals.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{EvalError, UnknownSet};

/// Seconds of 0001-01-01T00:00:00Z.
const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800;
/// Seconds of 9999-12-31T23:59:59Z.
const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799;
/// Roughly 10000 years.
const MAX_DURATION_SECONDS: i64 = 315_576_000_000;

/// A value produced or consumed by evaluation.
///
/// Payloads that may be large are `Arc`-shared so slots and stacks clone
/// cheaply.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(Arc<str>),
    Bytes(Arc<[u8]>),
    List(Arc<[Value]>),
    Map(Arc<ValueMap>),
    Timestamp(Timestamp),
    Duration(Duration),
    /// A type, as returned by `type(x)` or a resolved type name.
    Type(TypeValue),
    /// A record whose fields are read through [`StructValue`].
    Struct(Arc<dyn StructValue>),
    /// An in-band evaluation error.
    Error(Arc<EvalError>),
    /// Input that was declared unknown, with every marker that reached here.
    Unknown(Arc<UnknownSet>),
}

/// The kind of a value, as used by function descriptors.
///
/// `Any` is a wildcard used when a kind could not be narrowed statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Any,
    Null,
    Bool,
    Int,
    UInt,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    List,
    Map,
    Struct,
    Type,
    Error,
    Unknown,
}

impl Kind {
    /// The name used in call signatures, e.g. `int64` in `_+_(int64, uint64)`.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Null => "null_type",
            Kind::Bool => "bool",
            Kind::Int => "int64",
            Kind::UInt => "uint64",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Duration => "google.protobuf.Duration",
            Kind::Timestamp => "google.protobuf.Timestamp",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Struct => "message",
            Kind::Type => "type",
            Kind::Error => "*error*",
            Kind::Unknown => "*unknown*",
        }
    }

    /// True if a value of kind `other` may be passed where `self` is declared.
    pub fn is_compatible(&self, other: Kind) -> bool {
        *self == Kind::Any || other == Kind::Any || *self == other
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An externally defined record.
///
/// Field access and presence tests are delegated to the implementation;
/// equality compares type names and the set fields.
pub trait StructValue: fmt::Debug + Send + Sync {
    /// Fully qualified type name of the record.
    fn type_name(&self) -> &str;

    /// Read a field. Unknown field names yield a `no_such_field` error.
    fn field(&self, name: &str) -> Result<Value, EvalError>;

    /// Test field presence. Unknown field names yield a `no_such_field` error.
    fn has_field(&self, name: &str) -> Result<bool, EvalError>;

    /// The set fields, in a deterministic order.
    fn fields(&self) -> Vec<(String, Value)>;
}

/// An instant as seconds and nanos since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: i64,
    /// Always in `0..1_000_000_000` for valid timestamps.
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// True if the timestamp lies within years 0001 through 9999.
    pub fn is_valid(&self) -> bool {
        (MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&self.seconds)
            && (0..1_000_000_000).contains(&self.nanos)
    }

    /// `None` outside chrono's representable range.
    pub fn to_datetime_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }
}

/// A signed span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    pub seconds: i64,
    /// Nanoseconds component, carrying the same sign as `seconds`.
    pub nanos: i32,
}

impl Duration {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Splits a nanosecond count; both parts carry its sign.
    pub fn from_nanos(nanos: i128) -> Self {
        let seconds = (nanos / 1_000_000_000) as i64;
        let nanos = (nanos % 1_000_000_000) as i32;
        Self { seconds, nanos }
    }

    pub fn to_nanos(&self) -> i128 {
        self.seconds as i128 * 1_000_000_000 + self.nanos as i128
    }

    /// True if the duration lies within roughly +/- 10000 years.
    pub fn is_valid(&self) -> bool {
        self.seconds.abs() <= MAX_DURATION_SECONDS && self.nanos.abs() < 1_000_000_000
    }
}

/// A type name used as a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeValue {
    pub name: Arc<str>,
}

impl TypeValue {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

/// The scalar kinds permitted as map keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    String(Arc<str>),
}

impl MapKey {
    /// Double, bytes, and every non-scalar kind are rejected.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Int(i) => Ok(MapKey::Int(*i)),
            Value::UInt(u) => Ok(MapKey::UInt(*u)),
            Value::String(s) => Ok(MapKey::String(s.clone())),
            other => Err(EvalError::invalid_map_key(other.kind().name())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(i) => Value::Int(*i),
            MapKey::UInt(u) => Value::UInt(*u),
            MapKey::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::UInt(u) => write!(f, "{}u", u),
            MapKey::String(s) => write!(f, "{}", s),
        }
    }
}

/// Map literal contents, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: BTreeMap<MapKey, Value>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up an arbitrary value as a key.
    ///
    /// Numeric keys match across int, uint, and integral doubles, so `m[1u]`
    /// finds an entry stored under `1`.
    pub fn lookup(&self, key: &Value) -> Result<Option<&Value>, EvalError> {
        match key {
            Value::Double(d) => Ok(numeric_key_candidates_f64(*d)
                .into_iter()
                .find_map(|k| self.entries.get(&k))),
            Value::Int(i) => Ok(self.entries.get(&MapKey::Int(*i)).or_else(|| {
                u64::try_from(*i)
                    .ok()
                    .and_then(|u| self.entries.get(&MapKey::UInt(u)))
            })),
            Value::UInt(u) => Ok(self.entries.get(&MapKey::UInt(*u)).or_else(|| {
                i64::try_from(*u)
                    .ok()
                    .and_then(|i| self.entries.get(&MapKey::Int(i)))
            })),
            other => {
                let key = MapKey::from_value(other)?;
                Ok(self.entries.get(&key))
            }
        }
    }

    pub fn insert(&mut self, key: MapKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.keys()
    }
}

fn numeric_key_candidates_f64(d: f64) -> Vec<MapKey> {
    let mut keys = Vec::new();
    if d.fract() != 0.0 || !d.is_finite() {
        return keys;
    }
    if d >= i64::MIN as f64 && d < i64::MAX as f64 {
        keys.push(MapKey::Int(d as i64));
    }
    if d >= 0.0 && d < u64::MAX as f64 {
        keys.push(MapKey::UInt(d as u64));
    }
    keys
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn bytes(b: impl Into<Arc<[u8]>>) -> Self {
        Value::Bytes(b.into())
    }

    pub fn list(elements: impl Into<Arc<[Value]>>) -> Self {
        Value::List(elements.into())
    }

    /// A map from key/value pairs. Later duplicates replace earlier ones.
    pub fn map(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        Value::Map(Arc::new(ValueMap::from_entries(entries)))
    }

    pub fn timestamp(seconds: i64, nanos: i32) -> Self {
        Value::Timestamp(Timestamp::new(seconds, nanos))
    }

    pub fn duration(seconds: i64, nanos: i32) -> Self {
        Value::Duration(Duration::new(seconds, nanos))
    }

    pub fn new_type(name: impl Into<Arc<str>>) -> Self {
        Value::Type(TypeValue::new(name))
    }

    pub fn error(err: impl Into<EvalError>) -> Self {
        Value::Error(Arc::new(err.into()))
    }

    pub fn unknown(set: UnknownSet) -> Self {
        Value::Unknown(Arc::new(set))
    }
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::UInt(_) => Kind::UInt,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::Duration(_) => Kind::Duration,
            Value::Type(_) => Kind::Type,
            Value::Struct(_) => Kind::Struct,
            Value::Error(_) => Kind::Error,
            Value::Unknown(_) => Kind::Unknown,
        }
    }

    /// The runtime type of this value, as reported by `type()`.
    pub fn type_value(&self) -> TypeValue {
        let name = match self {
            Value::Struct(s) => return TypeValue::new(s.type_name()),
            Value::Null => "null_type",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Type(_) => "type",
            other => other.kind().name(),
        };
        TypeValue::new(name)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    /// True for errors and unknowns, the values strict functions never see.
    pub fn is_signal(&self) -> bool {
        matches!(self, Value::Error(_) | Value::Unknown(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&EvalError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownSet> {
        match self {
            Value::Unknown(u) => Some(u),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($source:ty => |$v:ident| $build:expr;)*) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $build
                }
            }
        )*
    };
}

value_from! {
    bool => |v| Value::Bool(v);
    i64 => |v| Value::Int(v);
    i32 => |v| Value::Int(i64::from(v));
    u64 => |v| Value::UInt(v);
    usize => |v| Value::UInt(v as u64);
    f64 => |v| Value::Double(v);
    &str => |v| Value::String(Arc::from(v));
    String => |v| Value::String(Arc::from(v));
    Vec<Value> => |v| Value::List(Arc::from(v));
    EvalError => |v| Value::Error(Arc::new(v));
    UnknownSet => |v| Value::Unknown(Arc::new(v));
}

/// Kind-strict structural equality.
///
/// Values of different kinds are never equal here; numeric cross-kind
/// equality is provided by [`Value::equals`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            // IEEE 754 semantics: NaN != NaN
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, val_a)| b.get(key) == Some(val_a))
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => {
                a.type_name() == b.type_name() && a.fields() == b.fields()
            }
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Unknown(a), Value::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Heterogeneous equality: numeric values compare by numeric value across
    /// int, uint, and double; other kinds compare structurally; values of
    /// unrelated kinds are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::UInt(_) | Value::Double(_), _)
                if matches!(other, Value::Int(_) | Value::UInt(_) | Value::Double(_)) =>
            {
                self.compare(other) == Some(Ordering::Equal)
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, val_a)| {
                        matches!(b.lookup(&key.to_value()), Ok(Some(val_b)) if val_a.equals(val_b))
                    })
            }
            _ => self == other,
        }
    }
}

impl Value {
    /// Ordering between values of one kind, or between any two numbers.
    ///
    /// `None` for incomparable kinds and for comparisons involving NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
            _ => numeric_cmp(self, other),
        }
    }
}

/// Integers compare exactly through `i128`; anything involving a double
/// compares as `f64`.
fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    let exact = |v: &Value| match v {
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        _ => None,
    };
    if let (Some(x), Some(y)) = (exact(a), exact(b)) {
        return Some(x.cmp(&y));
    }
    let float = |v: &Value| match v {
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Double(d) => Some(*d),
        _ => None,
    };
    float(a)?.partial_cmp(&float(b)?)
}

fn write_joined<I, T>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}u", u),
            Value::Double(d) if d.is_nan() => f.write_str("NaN"),
            Value::Double(d) if d.is_infinite() => {
                f.write_str(if *d > 0.0 { "+infinity" } else { "-infinity" })
            }
            Value::Double(d) if d.fract() == 0.0 => write!(f, "{}.0", d),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "b\"{}\"", String::from_utf8_lossy(b)),
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                write_joined(
                    f,
                    map.iter().map(|(k, v)| format!("{}: {}", k.to_value(), v)),
                )?;
                f.write_str("}")
            }
            Value::Timestamp(t) => write!(f, "timestamp({})", t.seconds),
            Value::Duration(d) => write!(f, "duration({}s)", d.seconds),
            Value::Type(t) => write!(f, "type({})", t.name),
            Value::Struct(record) => {
                write!(f, "{}{{", record.type_name())?;
                write_joined(
                    f,
                    record
                        .fields()
                        .into_iter()
                        .map(|(name, v)| format!("{}: {}", name, v)),
                )?;
                f.write_str("}")
            }
            Value::Error(e) => write!(f, "error({})", e),
            Value::Unknown(u) => write!(f, "{}", u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Attribute;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int(42), Value::Int(42));
        assert_ne!(Value::Int(42), Value::Int(43));
        assert_ne!(Value::Int(42), Value::UInt(42));
        assert_eq!(Value::string("hello"), Value::string("hello"));
    }

    #[test]
    fn test_heterogeneous_equality() {
        assert!(Value::Int(1).equals(&Value::UInt(1)));
        assert!(Value::Int(1).equals(&Value::Double(1.0)));
        assert!(!Value::Int(1).equals(&Value::string("1")));
        assert!(Value::list(vec![Value::Int(1)]).equals(&Value::list(vec![Value::UInt(1)])));
    }

    #[test]
    fn test_value_comparison() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::Int(2).compare(&Value::Int(1)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(-1).compare(&Value::UInt(1)), Some(Ordering::Less));
        assert_eq!(
            Value::Int(1).compare(&Value::Double(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(1).compare(&Value::string("a")), None);
    }

    #[test]
    fn test_map_keys_reject_double_and_bytes() {
        assert!(MapKey::from_value(&Value::Double(1.0)).is_err());
        assert!(MapKey::from_value(&Value::bytes(vec![1u8])).is_err());
        assert!(MapKey::from_value(&Value::Int(1)).is_ok());
    }

    #[test]
    fn test_map_cross_numeric_lookup() {
        let map = ValueMap::from_entries([(MapKey::Int(1), Value::string("one"))]);
        assert_eq!(
            map.lookup(&Value::UInt(1)).ok().flatten(),
            Some(&Value::string("one"))
        );
        assert_eq!(
            map.lookup(&Value::Double(1.0)).ok().flatten(),
            Some(&Value::string("one"))
        );
        assert_eq!(map.lookup(&Value::Double(1.5)).ok().flatten(), None);
        assert!(map.lookup(&Value::bytes(vec![1u8])).is_err());
    }

    #[test]
    fn test_map_equality_ignores_insertion_order() {
        let a = Value::map([
            (MapKey::Int(1), Value::Bool(true)),
            (MapKey::Int(2), Value::Bool(false)),
        ]);
        let b = Value::map([
            (MapKey::Int(2), Value::Bool(false)),
            (MapKey::Int(1), Value::Bool(true)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signals() {
        let err = Value::error(EvalError::division_by_zero());
        let unknown = Value::unknown(UnknownSet::from_attribute(Attribute::new("x")));
        assert!(err.is_signal() && err.is_error());
        assert!(unknown.is_signal() && unknown.is_unknown());
        assert_eq!(unknown.kind(), Kind::Unknown);
        assert!(!Value::Null.is_signal());
    }

    #[test]
    fn test_timestamp_validity() {
        assert!(Timestamp::from_seconds(0).is_valid());
        assert!(!Timestamp::from_seconds(MAX_TIMESTAMP_SECONDS + 1).is_valid());
        assert!(Duration::from_seconds(MAX_DURATION_SECONDS).is_valid());
        assert!(!Duration::from_seconds(MAX_DURATION_SECONDS + 1).is_valid());
    }

    #[test]
    fn test_duration_nanos() {
        let d = Duration::from_nanos(1_500_000_000);
        assert_eq!(d.seconds, 1);
        assert_eq!(d.nanos, 500_000_000);
        assert_eq!(d.to_nanos(), 1_500_000_000);
    }

    #[test]
    fn test_kind_compatibility() {
        assert!(Kind::Any.is_compatible(Kind::Int));
        assert!(Kind::Int.is_compatible(Kind::Any));
        assert!(!Kind::Int.is_compatible(Kind::UInt));
    }

    #[test]
    fn integers_compare_exactly_at_the_extremes() {
        assert_eq!(
            Value::UInt(u64::MAX).compare(&Value::Int(i64::MAX)),
            Some(Ordering::Greater)
        );
        assert!(!Value::UInt(u64::MAX).equals(&Value::Int(-1)));
        assert_eq!(Value::Double(f64::NAN).compare(&Value::Int(0)), None);
    }

    #[test]
    fn display_renders_literals() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::UInt(42).to_string(), "42u");
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::string("hello").to_string(), "\"hello\"");
        let list = Value::list(vec![Value::Int(1), Value::Bool(true)]);
        assert_eq!(list.to_string(), "[1, true]");
        let map = Value::map([(MapKey::String("k".into()), Value::Int(1))]);
        assert_eq!(map.to_string(), "{\"k\": 1}");
    }
}
