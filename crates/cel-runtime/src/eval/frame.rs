//! Evaluation state and the operations shared by both evaluators.
//!
//! The iterative and recursive evaluators differ only in how they walk the
//! program; every value-level decision (attribute tracking, unknown and error
//! precedence, overload dispatch, comprehension bookkeeping) lives here so
//! that both produce identical results.

use std::sync::Arc;

use super::functions::call_signature;
use super::plan::{CallTarget, LogicOp};
use super::unknown::{any_match, full_match};
use super::{
    Activation, Attribute, AttributePattern, EvalError, ExecError, FunctionResult, Kind, MapKey,
    Overload, Qualifier, RuntimeOptions, TypeProvider, UnknownSet, Value,
};

/// A value together with the attribute it was read from, if any.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub value: Value,
    pub trail: Option<Attribute>,
}

impl Slot {
    pub fn new(value: Value) -> Self {
        Self { value, trail: None }
    }

    pub fn with_trail(value: Value, trail: Option<Attribute>) -> Self {
        Self { value, trail }
    }
}

/// Bindings of one active comprehension.
#[derive(Debug)]
struct Scope {
    iter_var: Arc<str>,
    accu_var: Arc<str>,
    items: Vec<Value>,
    next: usize,
    iter_value: Option<Value>,
    /// Unbound until the initial value has been evaluated.
    accu: Option<Value>,
}

/// Per-evaluation state.
pub(crate) struct Frame<'a> {
    activation: &'a dyn Activation,
    provider: &'a dyn TypeProvider,
    options: &'a RuntimeOptions,
    unknown_patterns: &'a [AttributePattern],
    missing_patterns: &'a [AttributePattern],
    scopes: Vec<Scope>,
    iterations: usize,
}

impl<'a> Frame<'a> {
    pub fn new(
        activation: &'a dyn Activation,
        provider: &'a dyn TypeProvider,
        options: &'a RuntimeOptions,
    ) -> Self {
        let unknown_patterns: &'a [AttributePattern] =
            if options.unknown_processing.attributes_enabled() {
                activation.unknown_attribute_patterns()
            } else {
                &[]
            };
        let missing_patterns: &'a [AttributePattern] = if options.enable_missing_attribute_errors {
            activation.missing_attribute_patterns()
        } else {
            &[]
        };
        Self {
            activation,
            provider,
            options,
            unknown_patterns,
            missing_patterns,
            scopes: Vec::new(),
            iterations: 0,
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        self.options
    }

    fn tracks_attributes(&self) -> bool {
        !self.unknown_patterns.is_empty() || !self.missing_patterns.is_empty()
    }

    /// Classify an attribute: missing patterns win over unknown patterns.
    ///
    /// A qualified attribute is unknown when it is a prefix of an unknown
    /// pattern, since the value it yields contains the unknown part. A bare
    /// variable needs a full match.
    fn check_attribute(&self, attribute: &Attribute) -> Option<Value> {
        if full_match(self.missing_patterns, attribute).is_some() {
            tracing::trace!(attribute = %attribute, "missing attribute");
            return Some(Value::error(EvalError::missing_attribute(
                &attribute.to_string(),
            )));
        }
        let unknown = if attribute.qualifiers.is_empty() {
            full_match(self.unknown_patterns, attribute).is_some()
        } else {
            any_match(self.unknown_patterns, attribute)
        };
        if unknown {
            tracing::trace!(attribute = %attribute, "unknown attribute");
            return Some(Value::unknown(UnknownSet::from_attribute(
                attribute.clone(),
            )));
        }
        None
    }

    // ==================== Attributes ====================

    /// Resolve a variable, innermost comprehension scope first.
    pub fn ident(&self, name: &str) -> Slot {
        for scope in self.scopes.iter().rev() {
            if &*scope.accu_var == name {
                if let Some(accu) = &scope.accu {
                    return Slot::new(accu.clone());
                }
            }
            if &*scope.iter_var == name {
                if let Some(value) = &scope.iter_value {
                    return Slot::new(value.clone());
                }
            }
        }

        let trail = self.tracks_attributes().then(|| Attribute::new(name));
        if let Some(attribute) = &trail {
            if let Some(signal) = self.check_attribute(attribute) {
                return Slot::with_trail(signal, trail);
            }
        }
        let value = self
            .activation
            .resolve(name)
            .unwrap_or_else(|| Value::error(EvalError::no_such_attribute(name)));
        Slot::with_trail(value, trail)
    }

    /// Field selection or presence test.
    pub fn select(&self, operand: Slot, field: &Arc<str>, test_only: bool) -> Slot {
        if operand.value.is_signal() {
            return Slot::new(operand.value);
        }
        if test_only {
            return Slot::new(presence_test(&operand.value, field));
        }

        let trail = operand
            .trail
            .map(|t| t.qualify(Qualifier::String(field.clone())));
        if let Some(attribute) = &trail {
            if let Some(signal) = self.check_attribute(attribute) {
                return Slot::with_trail(signal, trail);
            }
        }
        let value = match &operand.value {
            Value::Map(map) => match map.lookup(&Value::String(field.clone())) {
                Ok(Some(value)) => value.clone(),
                Ok(None) => Value::error(EvalError::no_such_key(field)),
                Err(err) => Value::error(err),
            },
            Value::Struct(record) => record.field(field).unwrap_or_else(Value::error),
            other => Value::error(EvalError::invalid_argument(format!(
                "type '{}' does not support field selection",
                other.kind()
            ))),
        };
        Slot::with_trail(value, trail)
    }

    /// List index or map key access.
    pub fn index(&self, operand: Slot, key: Slot) -> Slot {
        let operands = [operand, key];
        if let Some(signal) = self
            .missing_error(&operands)
            .or_else(|| self.merge_signals(&operands, false))
        {
            return Slot::new(signal);
        }
        let [operand, key] = operands;

        let trail = match (operand.trail, Qualifier::from_value(&key.value)) {
            (Some(t), Some(q)) => Some(t.qualify(q)),
            _ => None,
        };
        if let Some(attribute) = &trail {
            if let Some(signal) = self.check_attribute(attribute) {
                return Slot::with_trail(signal, trail);
            }
        }
        Slot::with_trail(container_access(&operand.value, &key.value), trail)
    }

    // ==================== Precedence ====================

    /// Rule 1: an operand read from a missing attribute is a hard error.
    fn missing_error(&self, operands: &[Slot]) -> Option<Value> {
        if self.missing_patterns.is_empty() {
            return None;
        }
        operands.iter().find_map(|slot| {
            let trail = slot.trail.as_ref()?;
            full_match(self.missing_patterns, trail)
                .map(|_| Value::error(EvalError::missing_attribute(&trail.to_string())))
        })
    }

    /// Rules 2 and 3: the first error, else the union of all unknowns.
    ///
    /// With `use_partial`, a concrete operand whose trail is a prefix of an
    /// unknown pattern also counts as unknown.
    fn merge_signals(&self, operands: &[Slot], use_partial: bool) -> Option<Value> {
        if let Some(err) = operands.iter().find(|s| s.value.is_error()) {
            return Some(err.value.clone());
        }
        let mut merged: Option<UnknownSet> = None;
        for slot in operands {
            let contribution = match (&slot.value, &slot.trail) {
                (Value::Unknown(set), _) => Some((**set).clone()),
                (_, Some(trail)) if use_partial && any_match(self.unknown_patterns, trail) => {
                    Some(UnknownSet::from_attribute(trail.clone()))
                }
                _ => None,
            };
            if let Some(set) = contribution {
                merged = Some(match merged {
                    Some(acc) => acc.merge(&set),
                    None => set,
                });
            }
        }
        merged.map(Value::unknown)
    }

    fn operand_unknowns(operands: &[Slot]) -> UnknownSet {
        UnknownSet::merge_all(operands.iter().filter_map(|s| s.value.as_unknown()))
    }

    // ==================== Calls ====================

    /// Execute a call: missing attributes, then errors, then unknowns (for
    /// strict calls), then overload dispatch.
    pub fn call(&self, target: &CallTarget, id: i64, args: &[Slot]) -> Result<Value, ExecError> {
        if let Some(err) = self.missing_error(args) {
            return Ok(err);
        }
        let strict = target.is_strict();
        if strict {
            if let Some(signal) = self.merge_signals(args, true) {
                return Ok(signal);
            }
        }

        let values: Vec<Value> = args.iter().map(|s| s.value.clone()).collect();
        let kinds: Vec<Kind> = values.iter().map(Value::kind).collect();
        let result = match self.dispatch(target, &values, &kinds)? {
            Some(result) => result,
            None => {
                let signature = call_signature(&target.name, &kinds);
                tracing::trace!(signature = %signature, "no matching overload");
                Value::error(EvalError::no_matching_overload(&signature))
            }
        };

        let Value::Unknown(set) = &result else {
            return Ok(result);
        };
        let mut merged = (**set).clone();
        if !strict {
            merged = merged.merge(&Self::operand_unknowns(args));
        }
        if self.options.unknown_processing.functions_enabled() {
            merged = merged.merge(&UnknownSet::from_function_result(FunctionResult {
                function: Arc::from(target.name.as_str()),
                expr_id: id,
                args: values,
            }));
        }
        Ok(Value::unknown(merged))
    }

    /// Find and invoke the overload for the runtime argument kinds.
    ///
    /// Static overloads win; otherwise lazy descriptors are bound against
    /// the activation, which must supply exactly one implementation.
    fn dispatch(
        &self,
        target: &CallTarget,
        values: &[Value],
        kinds: &[Kind],
    ) -> Result<Option<Value>, ExecError> {
        if let Some(overload) = target
            .overloads
            .iter()
            .find(|o| o.descriptor.matches_kinds(kinds))
        {
            return overload.call(values).map(Some);
        }

        let mut bound: Vec<Overload> = Vec::new();
        for descriptor in target.lazy.iter().filter(|d| d.matches_kinds(kinds)) {
            for candidate in self.activation.find_function_overloads(&descriptor.name) {
                let applies = candidate.descriptor.receiver_style == descriptor.receiver_style
                    && candidate.descriptor.matches_kinds(kinds);
                let seen = bound.iter().any(|b| b.descriptor == candidate.descriptor);
                if applies && !seen {
                    bound.push(candidate);
                }
            }
        }
        match bound.as_slice() {
            [] => Ok(None),
            [overload] => overload.call(values).map(Some),
            _ => {
                tracing::debug!(
                    function = %target.name,
                    candidates = bound.len(),
                    "ambiguous lazy function binding"
                );
                Ok(Some(Value::error(EvalError::unresolved_function(
                    &target.name,
                ))))
            }
        }
    }

    /// Combine the operands of `&&` or `||`.
    pub fn logic(&self, op: LogicOp, lhs: Slot, rhs: Slot) -> Value {
        let decisive = op.short_circuit_value();
        if lhs.value.as_bool() == Some(decisive) || rhs.value.as_bool() == Some(decisive) {
            return Value::Bool(decisive);
        }
        let operands = [lhs, rhs];
        if let Some(signal) = self
            .missing_error(&operands)
            .or_else(|| self.merge_signals(&operands, false))
        {
            return signal;
        }
        match (&operands[0].value, &operands[1].value) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(match op {
                LogicOp::And => *a && *b,
                LogicOp::Or => *a || *b,
            }),
            (a, b) => Value::error(EvalError::no_matching_overload(&call_signature(
                op.function_name(),
                &[a.kind(), b.kind()],
            ))),
        }
    }

    /// Select a branch of `_?_:_` from a fully evaluated condition.
    pub fn ternary(&self, condition: Slot, then_value: Slot, else_value: Slot) -> Slot {
        match condition.value {
            Value::Bool(true) => then_value,
            Value::Bool(false) => else_value,
            other => Slot::new(ternary_condition_signal(other)),
        }
    }

    // ==================== Aggregates ====================

    pub fn create_list(&self, elements: Vec<Slot>) -> Value {
        if let Some(signal) = self
            .missing_error(&elements)
            .or_else(|| self.merge_signals(&elements, true))
        {
            return signal;
        }
        let values: Vec<Value> = elements.into_iter().map(|s| s.value).collect();
        Value::from(values)
    }

    /// Build a map from alternating key and value slots.
    pub fn create_map(&self, entries: Vec<Slot>) -> Value {
        if let Some(signal) = self
            .missing_error(&entries)
            .or_else(|| self.merge_signals(&entries, true))
        {
            return signal;
        }
        let mut map = super::ValueMap::new();
        for pair in entries.chunks(2) {
            let [key, value] = pair else {
                return Value::error(EvalError::internal("map entry without value"));
            };
            let key = match MapKey::from_value(&key.value) {
                Ok(key) => key,
                Err(err) => return Value::error(err),
            };
            if let Ok(Some(_)) = map.lookup(&key.to_value()) {
                return Value::error(EvalError::invalid_argument(format!(
                    "Failed with repeated key: {}",
                    key
                )));
            }
            map.insert(key, value.value.clone());
        }
        Value::Map(Arc::new(map))
    }

    pub fn create_struct(&self, type_name: &str, names: &[Arc<str>], values: Vec<Slot>) -> Value {
        if let Some(signal) = self
            .missing_error(&values)
            .or_else(|| self.merge_signals(&values, true))
        {
            return signal;
        }
        let fields = names
            .iter()
            .map(|n| n.to_string())
            .zip(values.into_iter().map(|s| s.value))
            .collect();
        self.provider
            .new_struct(type_name, fields)
            .unwrap_or_else(Value::error)
    }

    // ==================== Comprehensions ====================

    /// Open a comprehension over `range`.
    ///
    /// Returns the value that replaces the whole comprehension when the range
    /// is an error, an unknown, or not iterable.
    pub fn begin_comprehension(
        &mut self,
        iter_var: &Arc<str>,
        accu_var: &Arc<str>,
        range: Value,
    ) -> Option<Value> {
        let items = match range {
            Value::List(list) => list.to_vec(),
            Value::Map(map) => map.keys().map(MapKey::to_value).collect(),
            signal @ (Value::Error(_) | Value::Unknown(_)) => return Some(signal),
            _ => {
                return Some(Value::error(EvalError::no_matching_overload(
                    "<iter_range>",
                )))
            }
        };
        self.scopes.push(Scope {
            iter_var: iter_var.clone(),
            accu_var: accu_var.clone(),
            items,
            next: 0,
            iter_value: None,
            accu: None,
        });
        None
    }

    fn scope_mut(&mut self) -> Result<&mut Scope, ExecError> {
        self.scopes
            .last_mut()
            .ok_or_else(|| ExecError::MalformedPath("no active comprehension".to_string()))
    }

    pub fn set_accumulator(&mut self, value: Value) -> Result<(), ExecError> {
        self.scope_mut()?.accu = Some(value);
        Ok(())
    }

    /// Bind the next range element. Returns false when the loop is over,
    /// either because the range is exhausted or the iteration budget is spent.
    pub fn next_iteration(&mut self) -> Result<bool, ExecError> {
        let limit = self.options.max_comprehension_iterations;
        let exhausted_budget = limit > 0 && self.iterations >= limit;
        let scope = self.scopes.last_mut().ok_or_else(|| {
            ExecError::MalformedPath("no active comprehension".to_string())
        })?;
        if scope.next >= scope.items.len() {
            return Ok(false);
        }
        if exhausted_budget {
            tracing::debug!(limit, "comprehension iteration budget exceeded");
            scope.accu = Some(Value::error(EvalError::internal(
                "iteration budget exceeded",
            )));
            return Ok(false);
        }
        scope.iter_value = Some(scope.items[scope.next].clone());
        scope.next += 1;
        self.iterations += 1;
        Ok(true)
    }

    /// Apply the loop condition. Returns true to run the loop step.
    ///
    /// An error or unknown condition ends the loop and becomes the
    /// accumulator seen by the result expression.
    pub fn loop_condition(&mut self, condition: Value) -> Result<bool, ExecError> {
        match condition {
            Value::Bool(proceed) => Ok(proceed),
            signal @ (Value::Error(_) | Value::Unknown(_)) => {
                self.set_accumulator(signal)?;
                Ok(false)
            }
            _ => {
                self.set_accumulator(Value::error(EvalError::no_matching_overload(
                    "<loop_condition>",
                )))?;
                Ok(false)
            }
        }
    }

    /// Unbind the iteration variable before the result expression runs.
    pub fn finish_iterations(&mut self) -> Result<(), ExecError> {
        self.scope_mut()?.iter_value = None;
        Ok(())
    }

    pub fn end_comprehension(&mut self) -> Result<(), ExecError> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or_else(|| ExecError::MalformedPath("no active comprehension".to_string()))
    }

    /// Number of open comprehension scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }
}

/// The result of a ternary whose condition is not a boolean.
pub(crate) fn ternary_condition_signal(condition: Value) -> Value {
    match condition {
        signal @ (Value::Error(_) | Value::Unknown(_)) => signal,
        other => Value::error(EvalError::no_matching_overload(&call_signature(
            "_?_:_",
            &[other.kind(), Kind::Any, Kind::Any],
        ))),
    }
}

fn presence_test(operand: &Value, field: &str) -> Value {
    match operand {
        Value::Map(map) => Value::Bool(map.contains_key(&MapKey::String(Arc::from(field)))),
        Value::Struct(record) => record
            .has_field(field)
            .map(Value::Bool)
            .unwrap_or_else(Value::error),
        _ => Value::error(EvalError::no_such_field(field)),
    }
}

fn container_access(container: &Value, key: &Value) -> Value {
    match (container, key) {
        (Value::List(list), _) => {
            let index = match key {
                Value::Int(i) => Some(*i),
                Value::UInt(u) => i64::try_from(*u).ok(),
                Value::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
                _ => None,
            };
            let Some(index) = index else {
                return Value::error(EvalError::no_matching_overload(&call_signature(
                    "_[_]",
                    &[Kind::List, key.kind()],
                )));
            };
            usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i))
                .cloned()
                .unwrap_or_else(|| {
                    Value::error(EvalError::index_out_of_bounds(index, list.len()))
                })
        }
        (Value::Map(map), _) => match map.lookup(key) {
            Ok(Some(value)) => value.clone(),
            Ok(None) => Value::error(EvalError::no_such_key(&key_display(key))),
            Err(err) => Value::error(err),
        },
        _ => Value::error(EvalError::no_matching_overload(&call_signature(
            "_[_]",
            &[container.kind(), key.kind()],
        ))),
    }
}

fn key_display(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        other => other.to_string(),
    }
}
