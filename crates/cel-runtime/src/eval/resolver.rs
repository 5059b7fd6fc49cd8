//! Name resolution against a container namespace.
//!
//! CEL resolves a (possibly qualified) name by trying every prefix of the
//! container from longest to shortest, then the bare name. A leading `.`
//! marks an absolute name and disables the search.

use super::{
    FunctionDescriptor, FunctionRegistry, Kind, Overload, ProviderError, TypeDescriptor,
    TypeProvider, Value,
};

/// Resolves identifiers, types, and function overloads for one container.
pub struct Resolver<'a> {
    container: &'a str,
    registry: &'a FunctionRegistry,
    provider: &'a dyn TypeProvider,
    resolve_qualified_type_identifiers: bool,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for `container`.
    pub fn new(
        container: &'a str,
        registry: &'a FunctionRegistry,
        provider: &'a dyn TypeProvider,
        resolve_qualified_type_identifiers: bool,
    ) -> Self {
        Self {
            container: container.trim_matches('.'),
            registry,
            provider,
            resolve_qualified_type_identifiers,
        }
    }

    /// The container namespace.
    pub fn container(&self) -> &str {
        self.container
    }

    /// The candidate names for `candidate`, most specific first.
    ///
    /// With container `google.api.expr`, `simple_name` yields
    /// `google.api.expr.simple_name`, `google.api.simple_name`,
    /// `google.simple_name`, and `simple_name`.
    pub fn fully_qualified_names(&self, candidate: &str) -> Vec<String> {
        if let Some(absolute) = candidate.strip_prefix('.') {
            return vec![absolute.to_string()];
        }
        let mut names = Vec::new();
        let mut prefix = self.container;
        while !prefix.is_empty() {
            names.push(format!("{}.{}", prefix, candidate));
            prefix = match prefix.rfind('.') {
                Some(pos) => &prefix[..pos],
                None => "",
            };
        }
        names.push(candidate.to_string());
        names
    }

    /// Resolve `candidate` as an enum constant or a type value.
    ///
    /// Each candidate name is tried as an enum constant first, then as a
    /// type. Qualified names only resolve to types when qualified type
    /// identifiers are enabled.
    pub fn find_constant(&self, candidate: &str, expr_id: i64) -> Option<Value> {
        let absolute = candidate.starts_with('.');
        for name in self.fully_qualified_names(candidate) {
            if let Some(value) = self.provider.find_enum_constant(&name) {
                tracing::trace!(expr_id, name = %name, "resolved enum constant");
                return Some(Value::Int(value));
            }
            let type_lookup_allowed = if absolute {
                self.resolve_qualified_type_identifiers
            } else {
                self.resolve_qualified_type_identifiers || !name.contains('.')
            };
            if !type_lookup_allowed {
                continue;
            }
            if let Ok(Some(descriptor)) = self.provider.find_type(&name) {
                tracing::trace!(expr_id, name = %name, "resolved type identifier");
                return Some(Value::new_type(descriptor.name));
            }
        }
        None
    }

    /// Resolve `candidate` as a type, returning the name that matched.
    ///
    /// Not finding the type is `Ok(None)`; provider failures propagate.
    pub fn find_type(
        &self,
        candidate: &str,
        expr_id: i64,
    ) -> Result<Option<(String, TypeDescriptor)>, ProviderError> {
        for name in self.fully_qualified_names(candidate) {
            if let Some(descriptor) = self.provider.find_type(&name)? {
                tracing::trace!(expr_id, name = %name, "resolved type");
                return Ok(Some((name, descriptor)));
            }
        }
        Ok(None)
    }

    /// The names tried for a function call. Receiver-style calls always try
    /// the unqualified name as well.
    fn function_names(&self, name: &str, receiver_style: bool) -> Vec<String> {
        let mut names = self.fully_qualified_names(name);
        if receiver_style {
            let bare = name.trim_start_matches('.');
            if !names.iter().any(|n| n == bare) {
                names.push(bare.to_string());
            }
        }
        names
    }

    /// Static overloads for a call, concatenated across every candidate name.
    pub fn find_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        kinds: &[Kind],
    ) -> Vec<&'a Overload> {
        let registry = self.registry;
        self.function_names(name, receiver_style)
            .iter()
            .flat_map(|n| registry.find_static_overloads(n, receiver_style, kinds))
            .collect()
    }

    /// Lazy descriptors for a call, concatenated across every candidate name.
    pub fn find_lazy_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        kinds: &[Kind],
    ) -> Vec<&'a FunctionDescriptor> {
        let registry = self.registry;
        self.function_names(name, receiver_style)
            .iter()
            .flat_map(|n| registry.find_lazy_overloads(n, receiver_style, kinds))
            .collect()
    }

    /// True if any candidate name for `name` is registered as a function.
    pub fn is_function(&self, name: &str) -> bool {
        self.fully_qualified_names(name)
            .iter()
            .any(|n| self.registry.contains(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{IntoFunctionImpl, StaticTypeProvider};

    fn noop(_: &[Value]) -> Value {
        Value::Null
    }

    #[test]
    fn fully_qualified_names_search_order() {
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new();
        let resolver = Resolver::new("google.api.expr", &registry, &provider, false);
        assert_eq!(
            resolver.fully_qualified_names("simple_name"),
            vec![
                "google.api.expr.simple_name",
                "google.api.simple_name",
                "google.simple_name",
                "simple_name",
            ]
        );
        assert_eq!(
            resolver.fully_qualified_names(".absolute.name"),
            vec!["absolute.name"]
        );
    }

    #[test]
    fn empty_container() {
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new();
        let resolver = Resolver::new("", &registry, &provider, false);
        assert_eq!(resolver.fully_qualified_names("x"), vec!["x"]);
    }

    #[test]
    fn find_constant_enum() {
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new()
            .with_enum("pkg.TestMessage.TestEnum", [("TEST_ENUM_1", 1)]);
        let resolver = Resolver::new("pkg.TestMessage", &registry, &provider, false);
        assert_eq!(
            resolver.find_constant("TestEnum.TEST_ENUM_1", -1),
            Some(Value::Int(1))
        );
        assert_eq!(resolver.find_constant("TestEnum.TEST_ENUM_9", -1), None);
    }

    #[test]
    fn find_constant_types_respect_qualification_flag() {
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new().with_message("pkg.Msg", ["f"]);

        let resolver = Resolver::new("pkg", &registry, &provider, false);
        assert_eq!(resolver.find_constant("int", -1), Some(Value::new_type("int")));
        assert_eq!(resolver.find_constant("Msg", -1), None);
        assert_eq!(resolver.find_constant(".int", -1), None);

        let resolver = Resolver::new("pkg", &registry, &provider, true);
        assert_eq!(
            resolver.find_constant("Msg", -1),
            Some(Value::new_type("pkg.Msg"))
        );
        assert_eq!(resolver.find_constant(".int", -1), Some(Value::new_type("int")));
    }

    #[test]
    fn find_type_reports_matching_name() {
        let registry = FunctionRegistry::new();
        let provider = StaticTypeProvider::new().with_message("a.Msg", ["f"]);
        let resolver = Resolver::new("a.b", &registry, &provider, false);
        let (name, _) = resolver.find_type("Msg", -1).unwrap().unwrap();
        assert_eq!(name, "a.Msg");
        assert!(resolver.find_type("Other", -1).unwrap().is_none());
    }

    #[test]
    fn find_overloads_concatenates_qualified_and_bare_names() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(
                FunctionDescriptor::new("fake_func", false, vec![Kind::Any]),
                noop.into_impl(),
            )
            .unwrap();
        registry
            .register(
                FunctionDescriptor::new("cel.fake_func", false, vec![Kind::Any]),
                noop.into_impl(),
            )
            .unwrap();
        let provider = StaticTypeProvider::new();
        let resolver = Resolver::new("cel", &registry, &provider, false);

        let found = resolver.find_overloads("fake_func", false, &[Kind::Int]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].descriptor.name, "cel.fake_func");
        assert_eq!(found[1].descriptor.name, "fake_func");
    }

    #[test]
    fn receiver_calls_try_bare_name() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_lazy(FunctionDescriptor::new("size", true, vec![Kind::Any]))
            .unwrap();
        let provider = StaticTypeProvider::new();
        let resolver = Resolver::new("pkg", &registry, &provider, false);
        assert_eq!(resolver.find_lazy_overloads(".size", true, &[Kind::Any]).len(), 1);
        assert!(resolver.find_lazy_overloads(".size", false, &[Kind::Any]).is_empty());
    }
}
