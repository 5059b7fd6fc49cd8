//! Attribute trails, attribute patterns, and unknown sets.
//!
//! An attribute is a root variable plus the qualifiers applied to it
//! (`request.auth.claims["sub"]`). Activations declare patterns over
//! attributes; the evaluator compares the trail it accumulates for each value
//! against those patterns to decide whether the value is unknown or missing.

use std::fmt;
use std::sync::Arc;

use super::Value;

/// A single field or key access applied to an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Qualifier {
    /// A field select or a string map key.
    String(Arc<str>),
    /// A signed integer index or key.
    Int(i64),
    /// An unsigned integer key.
    UInt(u64),
    /// A boolean key.
    Bool(bool),
}

impl Qualifier {
    /// Build a qualifier from a key value. Map-key kinds qualify, and so do
    /// integral doubles, which index like the integer they equal.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Qualifier::String(s.clone())),
            Value::Int(i) => Some(Qualifier::Int(*i)),
            Value::UInt(u) => Some(Qualifier::UInt(*u)),
            Value::Bool(b) => Some(Qualifier::Bool(*b)),
            Value::Double(d) if d.fract() == 0.0 && d.is_finite() => {
                if *d >= i64::MIN as f64 && *d < i64::MAX as f64 {
                    Some(Qualifier::Int(*d as i64))
                } else if *d >= 0.0 && *d < u64::MAX as f64 {
                    Some(Qualifier::UInt(*d as u64))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::String(s) => write!(f, ".{}", s),
            Qualifier::Int(i) => write!(f, "[{}]", i),
            Qualifier::UInt(u) => write!(f, "[{}u]", u),
            Qualifier::Bool(b) => write!(f, "[{}]", b),
        }
    }
}

/// A root variable and the qualifier path applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attribute {
    pub variable: Arc<str>,
    pub qualifiers: Vec<Qualifier>,
}

impl Attribute {
    /// Create an attribute with an empty qualifier path.
    pub fn new(variable: impl Into<Arc<str>>) -> Self {
        Self {
            variable: variable.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Return a new attribute with `qualifier` appended.
    pub fn qualify(&self, qualifier: Qualifier) -> Self {
        let mut qualifiers = self.qualifiers.clone();
        qualifiers.push(qualifier);
        Self {
            variable: self.variable.clone(),
            qualifiers,
        }
    }

    /// Append a field qualifier (builder style).
    pub fn field(mut self, name: &str) -> Self {
        self.qualifiers.push(Qualifier::String(Arc::from(name)));
        self
    }

    /// Append an integer index qualifier (builder style).
    pub fn index(mut self, index: i64) -> Self {
        self.qualifiers.push(Qualifier::Int(index));
        self
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable)?;
        for qualifier in &self.qualifiers {
            write!(f, "{}", qualifier)?;
        }
        Ok(())
    }
}

/// One position of an attribute pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierPattern {
    Exact(Qualifier),
    Wildcard,
}

impl QualifierPattern {
    fn matches(&self, qualifier: &Qualifier) -> bool {
        match self {
            QualifierPattern::Wildcard => true,
            QualifierPattern::Exact(q) => q == qualifier,
        }
    }
}

/// How an attribute trail relates to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// The trail diverges from the pattern.
    None,
    /// The trail is a strict prefix of the pattern.
    Partial,
    /// The pattern is a prefix of (or equal to) the trail.
    Full,
}

/// A declared unknown or missing attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePattern {
    pub variable: Arc<str>,
    pub qualifiers: Vec<QualifierPattern>,
}

impl AttributePattern {
    /// A pattern over the whole variable.
    pub fn new(variable: impl Into<Arc<str>>) -> Self {
        Self {
            variable: variable.into(),
            qualifiers: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str) -> Self {
        self.qualifiers
            .push(QualifierPattern::Exact(Qualifier::String(Arc::from(name))));
        self
    }

    pub fn index(mut self, index: i64) -> Self {
        self.qualifiers
            .push(QualifierPattern::Exact(Qualifier::Int(index)));
        self
    }

    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(QualifierPattern::Exact(qualifier));
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.qualifiers.push(QualifierPattern::Wildcard);
        self
    }

    /// Compare an attribute trail against this pattern.
    pub fn match_attribute(&self, attribute: &Attribute) -> MatchType {
        if self.variable != attribute.variable {
            return MatchType::None;
        }
        let shared = self.qualifiers.len().min(attribute.qualifiers.len());
        let diverges = self.qualifiers[..shared]
            .iter()
            .zip(&attribute.qualifiers[..shared])
            .any(|(pattern, qualifier)| !pattern.matches(qualifier));
        if diverges {
            MatchType::None
        } else if self.qualifiers.len() <= attribute.qualifiers.len() {
            MatchType::Full
        } else {
            MatchType::Partial
        }
    }
}

/// Marker for a function call whose result was reported as unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub function: Arc<str>,
    pub expr_id: i64,
    pub args: Vec<Value>,
}

/// A set of unknown markers.
///
/// Equality is set equality; merging is set union and never mutates either
/// input.
#[derive(Debug, Clone, Default)]
pub struct UnknownSet {
    attributes: Vec<Attribute>,
    function_results: Vec<FunctionResult>,
}

impl UnknownSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An unknown set holding a single attribute.
    pub fn from_attribute(attribute: Attribute) -> Self {
        Self {
            attributes: vec![attribute],
            function_results: Vec::new(),
        }
    }

    /// An unknown set holding a single function-result marker.
    pub fn from_function_result(result: FunctionResult) -> Self {
        Self {
            attributes: Vec::new(),
            function_results: vec![result],
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn function_results(&self) -> &[FunctionResult] {
        &self.function_results
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.function_results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len() + self.function_results.len()
    }

    pub fn contains_attribute(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    fn add_attribute(&mut self, attribute: &Attribute) {
        if !self.attributes.contains(attribute) {
            self.attributes.push(attribute.clone());
        }
    }

    fn add_function_result(&mut self, result: &FunctionResult) {
        if !self.function_results.contains(result) {
            self.function_results.push(result.clone());
        }
    }

    /// Union of `self` and `other`.
    pub fn merge(&self, other: &UnknownSet) -> UnknownSet {
        let mut merged = self.clone();
        for attribute in &other.attributes {
            merged.add_attribute(attribute);
        }
        for result in &other.function_results {
            merged.add_function_result(result);
        }
        merged
    }

    /// Union of every set yielded by `sets`.
    pub fn merge_all<'a>(sets: impl IntoIterator<Item = &'a UnknownSet>) -> UnknownSet {
        sets.into_iter()
            .fold(UnknownSet::new(), |acc, set| acc.merge(set))
    }
}

impl PartialEq for UnknownSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes.len() == other.attributes.len()
            && self.function_results.len() == other.function_results.len()
            && self.attributes.iter().all(|a| other.attributes.contains(a))
            && self
                .function_results
                .iter()
                .all(|r| other.function_results.contains(r))
    }
}

impl fmt::Display for UnknownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown{{")?;
        let mut first = true;
        for attribute in &self.attributes {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", attribute)?;
        }
        for result in &self.function_results {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}#{}(...)", result.function, result.expr_id)?;
        }
        write!(f, "}}")
    }
}

/// Find the first pattern fully matching `attribute`.
pub(crate) fn full_match<'p>(
    patterns: &'p [AttributePattern],
    attribute: &Attribute,
) -> Option<&'p AttributePattern> {
    patterns
        .iter()
        .find(|p| p.match_attribute(attribute) == MatchType::Full)
}

/// True if any pattern matches `attribute` fully or partially.
pub(crate) fn any_match(patterns: &[AttributePattern], attribute: &Attribute) -> bool {
    patterns
        .iter()
        .any(|p| p.match_attribute(attribute) != MatchType::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_match_types() {
        let pattern = AttributePattern::new("var").field("child").field("child");

        assert_eq!(
            pattern.match_attribute(&Attribute::new("var")),
            MatchType::Partial
        );
        assert_eq!(
            pattern.match_attribute(&Attribute::new("var").field("child")),
            MatchType::Partial
        );
        assert_eq!(
            pattern.match_attribute(&Attribute::new("var").field("child").field("child")),
            MatchType::Full
        );
        assert_eq!(
            pattern.match_attribute(
                &Attribute::new("var")
                    .field("child")
                    .field("child")
                    .field("leaf")
            ),
            MatchType::Full
        );
        assert_eq!(
            pattern.match_attribute(&Attribute::new("var").field("other")),
            MatchType::None
        );
        assert_eq!(
            pattern.match_attribute(&Attribute::new("other")),
            MatchType::None
        );
    }

    #[test]
    fn wildcard_matches_any_qualifier() {
        let pattern = AttributePattern::new("list").wildcard().field("name");
        let attr = Attribute::new("list").index(3).field("name");
        assert_eq!(pattern.match_attribute(&attr), MatchType::Full);
    }

    #[test]
    fn merge_collapses_duplicates() {
        let a = UnknownSet::from_attribute(Attribute::new("a"));
        let b = UnknownSet::from_attribute(Attribute::new("b"));
        let merged = a.merge(&b).merge(&a);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged, b.merge(&a));
    }

    #[test]
    fn merge_does_not_mutate_inputs() {
        let a = UnknownSet::from_attribute(Attribute::new("a"));
        let b = UnknownSet::from_attribute(Attribute::new("b"));
        let _ = a.merge(&b);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn integral_doubles_qualify_as_integers() {
        assert_eq!(
            Qualifier::from_value(&Value::Double(1.0)),
            Some(Qualifier::Int(1))
        );
        assert_eq!(
            Qualifier::from_value(&Value::Double(1e19)),
            Some(Qualifier::UInt(10_000_000_000_000_000_000))
        );
        assert_eq!(Qualifier::from_value(&Value::Double(1.5)), None);
        assert_eq!(Qualifier::from_value(&Value::Double(f64::NAN)), None);
    }

    #[test]
    fn attribute_display() {
        let attr = Attribute::new("msg").field("items").index(2);
        assert_eq!(attr.to_string(), "msg.items[2]");
    }
}
