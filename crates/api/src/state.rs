use std::sync::Arc;

use infra::DocumentStore;

use crate::gql::{build_bindings, build_schema, QueryExecutor, ResolverBindings, SchemaRegistry};

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    executor: QueryExecutor,
}

impl AppState {
    /// State over the lacrosse schema and its standard bindings.
    pub fn new(store: DocumentStore) -> Self {
        let bindings = build_bindings(store.clone());
        Self::with_parts(store, build_schema(), bindings)
    }

    pub fn with_parts(
        store: DocumentStore,
        schema: SchemaRegistry,
        bindings: ResolverBindings,
    ) -> Self {
        let executor = QueryExecutor::new(Arc::new(schema), Arc::new(bindings));
        Self { store, executor }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }
}
