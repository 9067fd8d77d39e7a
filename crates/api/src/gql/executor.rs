use futures_util::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use super::bindings::{default_resolve, ResolveParams, ResolverBindings};
use super::error::{FieldError, FieldErrorKind, FieldPath};
use super::plan::{plan, FieldPlan, PlannedField};
use super::schema::{SchemaRegistry, TypeRef};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default)]
    pub operation_name: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl QueryResponse {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

type ErrorSink = Mutex<Vec<FieldError>>;

/// Resolves query documents against a schema and its resolver bindings.
///
/// Problems never abort a request: each one becomes an entry in
/// `QueryResponse::errors` and the affected branch is `null`.
#[derive(Clone)]
pub struct QueryExecutor {
    schema: Arc<SchemaRegistry>,
    bindings: Arc<ResolverBindings>,
}

impl QueryExecutor {
    pub fn new(schema: Arc<SchemaRegistry>, bindings: Arc<ResolverBindings>) -> Self {
        Self { schema, bindings }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn bindings(&self) -> &ResolverBindings {
        &self.bindings
    }

    pub async fn execute(&self, request: QueryRequest) -> QueryResponse {
        let started = Instant::now();
        let variables = request.variables.unwrap_or_default();
        let planned = plan(
            &self.schema,
            &request.query,
            &variables,
            request.operation_name.as_deref(),
        );

        let errors: ErrorSink = Mutex::new(planned.errors);
        let root = Value::Null;
        let data = match &planned.operation {
            Some(operation) => {
                self.resolve_selection(
                    &operation.root_type,
                    &root,
                    &operation.selection,
                    &FieldPath::root(),
                    &errors,
                )
                .await
            }
            None => Value::Null,
        };

        let errors = errors.into_inner();
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            errors = errors.len(),
            "Executed query"
        );
        QueryResponse { data, errors }
    }

    /// Resolves every field of one selection concurrently and assembles the
    /// object in selection order.
    fn resolve_selection<'a>(
        &'a self,
        type_name: &'a str,
        parent: &'a Value,
        selection: &'a [PlannedField],
        path: &'a FieldPath,
        errors: &'a ErrorSink,
    ) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let values = join_all(
                selection
                    .iter()
                    .map(|field| self.resolve_field(type_name, parent, field, path, errors)),
            )
            .await;

            let object: Map<String, Value> = selection
                .iter()
                .zip(values)
                .map(|(field, value)| (field.response_key.clone(), value))
                .collect();
            Value::Object(object)
        })
    }

    async fn resolve_field(
        &self,
        type_name: &str,
        parent: &Value,
        field: &PlannedField,
        path: &FieldPath,
        errors: &ErrorSink,
    ) -> Value {
        let (ty, selection) = match &field.plan {
            FieldPlan::Invalid => return Value::Null,
            FieldPlan::Typename => return Value::String(type_name.to_string()),
            FieldPlan::Resolve { ty, selection } => (ty, selection),
        };
        let field_path = path.field(&field.response_key);

        let resolved = match self.bindings.get(type_name, &field.name) {
            Some(resolver) => {
                resolver(ResolveParams {
                    parent: parent.clone(),
                    arguments: field.arguments.clone(),
                })
                .await
            }
            None => Ok(default_resolve(parent, &field.name)),
        };

        match resolved {
            Ok(value) => {
                self.complete_value(ty, value, selection, &field_path, errors)
                    .await
            }
            Err(e) => {
                tracing::warn!(path = %field_path, error = %e, "Resolver failed");
                errors.lock().push(FieldError::new(
                    FieldErrorKind::ResolverFailure,
                    field_path,
                    e.to_string(),
                ));
                Value::Null
            }
        }
    }

    /// Shapes a resolved value by its declared type. `null` stops here, so
    /// nothing below a missing value is resolved.
    fn complete_value<'a>(
        &'a self,
        ty: &'a TypeRef,
        value: Value,
        selection: &'a [PlannedField],
        path: &'a FieldPath,
        errors: &'a ErrorSink,
    ) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            if value.is_null() {
                return Value::Null;
            }

            match ty {
                TypeRef::Scalar(kind) => kind.coerce(&value).unwrap_or_else(|| {
                    errors.lock().push(FieldError::new(
                        FieldErrorKind::ResolverFailure,
                        path.clone(),
                        format!("expected a value of type `{kind}`, found {value}"),
                    ));
                    Value::Null
                }),
                TypeRef::Named(type_name) => {
                    if !value.is_object() {
                        errors.lock().push(FieldError::new(
                            FieldErrorKind::ResolverFailure,
                            path.clone(),
                            format!("expected an object of type `{type_name}`, found {value}"),
                        ));
                        return Value::Null;
                    }
                    self.resolve_selection(type_name, &value, selection, path, errors)
                        .await
                }
                TypeRef::List(inner) => match value {
                    Value::Array(items) => {
                        let completed = join_all(items.into_iter().enumerate().map(|(i, item)| {
                            let item_path = path.index(i);
                            async move {
                                self.complete_value(inner, item, selection, &item_path, errors)
                                    .await
                            }
                        }))
                        .await;
                        Value::Array(completed)
                    }
                    other => {
                        errors.lock().push(FieldError::new(
                            FieldErrorKind::ResolverFailure,
                            path.clone(),
                            format!("expected a list of `{inner}`, found {other}"),
                        ));
                        Value::Null
                    }
                },
            }
        })
    }
}
