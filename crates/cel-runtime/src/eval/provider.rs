//! Type provider capability and an in-memory implementation.
//!
//! The evaluator never inspects external records directly. Type names, enum
//! constants, and record construction are delegated to a [`TypeProvider`],
//! and field access on records goes through the [`StructValue`] trait.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{Code, EvalError, ProviderError, StructValue, Value};

/// What a resolved type name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptorKind {
    /// A builtin CEL type such as `int` or `google.protobuf.Timestamp`.
    Builtin,
    /// A record type with its declared field names.
    Message { fields: Vec<String> },
    /// An enum type with its named constants.
    Enum { values: BTreeMap<String, i64> },
}

/// A type known to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Fully qualified type name.
    pub name: String,
    pub kind: TypeDescriptorKind,
}

/// Resolves type names and enum constants, and builds records.
pub trait TypeProvider: Send + Sync {
    /// Look up a fully qualified type name.
    ///
    /// Absence is `Ok(None)`; `Err` is reserved for provider failures.
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, ProviderError>;

    /// Look up a fully qualified enum constant, e.g. `pkg.Enum.VALUE`.
    fn find_enum_constant(&self, qualified_name: &str) -> Option<i64>;

    /// Construct a record of `type_name` from field initializers.
    fn new_struct(&self, type_name: &str, fields: Vec<(String, Value)>)
        -> Result<Value, EvalError>;
}

const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "int",
    "uint",
    "double",
    "string",
    "bytes",
    "list",
    "map",
    "null_type",
    "type",
    "google.protobuf.Timestamp",
    "google.protobuf.Duration",
];

/// An in-memory type provider.
///
/// Knows the builtin type names plus any registered enums and record types.
#[derive(Debug, Clone)]
pub struct StaticTypeProvider {
    types: HashMap<String, TypeDescriptor>,
}

impl Default for StaticTypeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticTypeProvider {
    /// Create a provider knowing only the builtin types.
    pub fn new() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    TypeDescriptor {
                        name: name.to_string(),
                        kind: TypeDescriptorKind::Builtin,
                    },
                )
            })
            .collect();
        Self { types }
    }

    /// Register an enum type with its constants.
    pub fn with_enum<'a>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Self {
        let name = name.into();
        let values = values
            .into_iter()
            .map(|(constant, value)| (constant.to_string(), value))
            .collect();
        self.types.insert(
            name.clone(),
            TypeDescriptor {
                name,
                kind: TypeDescriptorKind::Enum { values },
            },
        );
        self
    }

    /// Register a record type with its declared field names.
    pub fn with_message<'a>(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let name = name.into();
        let fields = fields.into_iter().map(str::to_string).collect();
        self.types.insert(
            name.clone(),
            TypeDescriptor {
                name,
                kind: TypeDescriptorKind::Message { fields },
            },
        );
        self
    }
}

impl TypeProvider for StaticTypeProvider {
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, ProviderError> {
        Ok(self.types.get(name).cloned())
    }

    fn find_enum_constant(&self, qualified_name: &str) -> Option<i64> {
        let (enum_name, constant) = qualified_name.rsplit_once('.')?;
        match &self.types.get(enum_name)?.kind {
            TypeDescriptorKind::Enum { values } => values.get(constant).copied(),
            _ => None,
        }
    }

    fn new_struct(
        &self,
        type_name: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        let descriptor = self.types.get(type_name).ok_or_else(|| {
            EvalError::new(Code::NotFound, format!("unknown type: {}", type_name))
        })?;
        let TypeDescriptorKind::Message { fields: declared } = &descriptor.kind else {
            return Err(EvalError::invalid_argument(format!(
                "{} is not a message type",
                type_name
            )));
        };
        let mut values = BTreeMap::new();
        for (name, value) in fields {
            if !declared.contains(&name) {
                return Err(EvalError::no_such_field(&name));
            }
            values.insert(name, value);
        }
        Ok(Value::Struct(Arc::new(Record {
            type_name: descriptor.name.clone(),
            declared: declared.clone(),
            values,
        })))
    }
}

/// A record produced by [`StaticTypeProvider`].
///
/// Declared fields that were never set read as `null` and test as absent.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    declared: Vec<String>,
    values: BTreeMap<String, Value>,
}

impl StructValue for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        if self.declared.iter().any(|f| f == name) {
            Ok(Value::Null)
        } else {
            Err(EvalError::no_such_field(name))
        }
    }

    fn has_field(&self, name: &str) -> Result<bool, EvalError> {
        if self.declared.iter().any(|f| f == name) {
            Ok(self.values.contains_key(name))
        } else {
            Err(EvalError::no_such_field(name))
        }
    }

    fn fields(&self) -> Vec<(String, Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
