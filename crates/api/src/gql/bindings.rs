use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::error::ResolverError;

pub type ResolverResult = Result<Value, ResolverError>;

pub type Resolver = Arc<dyn Fn(ResolveParams) -> BoxFuture<'static, ResolverResult> + Send + Sync>;

/// Coerced arguments of one field selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn require_str(&self, name: &str) -> Result<&str, ResolverError> {
        self.get_str(name)
            .ok_or_else(|| ResolverError::new(format!("missing argument `{name}`")))
    }
}

/// What a resolver is called with: the resolved parent value (`null` for root
/// fields) and the field's arguments.
#[derive(Debug, Clone)]
pub struct ResolveParams {
    pub parent: Value,
    pub arguments: Arguments,
}

/// Table from `(type, field)` to the function producing that field's value.
/// Fields without an entry read the same-named member of the parent value.
#[derive(Clone, Default)]
pub struct ResolverBindings {
    table: HashMap<(String, String), Resolver>,
}

impl ResolverBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `type_name.field_name`, replacing any earlier binding.
    pub fn bind<F, Fut>(&mut self, type_name: &str, field_name: &str, f: F) -> &mut Self
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        let resolver: Resolver =
            Arc::new(move |params| -> BoxFuture<'static, ResolverResult> { Box::pin(f(params)) });
        self.table
            .insert((type_name.to_string(), field_name.to_string()), resolver);
        self
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&Resolver> {
        self.table
            .get(&(type_name.to_string(), field_name.to_string()))
    }

    pub fn contains(&self, type_name: &str, field_name: &str) -> bool {
        self.get(type_name, field_name).is_some()
    }
}

/// Resolver used when a field has no binding: the parent's member of the
/// same name, or `null`.
pub fn default_resolve(parent: &Value, field_name: &str) -> Value {
    parent.get(field_name).cloned().unwrap_or(Value::Null)
}
