pub mod bindings;
pub mod error;
pub mod executor;
pub mod plan;
pub mod resolvers;
pub mod schema;

pub use bindings::{ResolveParams, ResolverBindings};
pub use error::{FieldError, FieldErrorKind, FieldPath, ResolverError};
pub use executor::{QueryExecutor, QueryRequest, QueryResponse};
pub use resolvers::build_bindings;
pub use schema::{build_schema, SchemaRegistry};
