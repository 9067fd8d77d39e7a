use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Name of the root type every query starts from.
pub const QUERY_TYPE: &str = "RootQuery";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown type `{0}`")]
    UnknownType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
    Id,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Id => "ID",
        }
    }

    /// Coerce a JSON value to this scalar kind. `None` means the value does
    /// not fit; `null` always passes through.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (ScalarKind::String, Value::String(_)) => Some(value.clone()),
            (ScalarKind::Id, Value::String(_)) => Some(value.clone()),
            (ScalarKind::Id, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(Value::String(n.to_string()))
            }
            (ScalarKind::Int, Value::Number(n)) => {
                let n = n.as_i64()?;
                i32::try_from(n).ok().map(Value::from)
            }
            (ScalarKind::Float, Value::Number(_)) => Some(value.clone()),
            (ScalarKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarKind),
    /// An object type, looked up by name when a query reaches it.
    Named(String),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub const STRING: TypeRef = TypeRef::Scalar(ScalarKind::String);
    pub const INT: TypeRef = TypeRef::Scalar(ScalarKind::Int);
    pub const ID: TypeRef = TypeRef::Scalar(ScalarKind::Id);

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// The type under any list wrappers.
    pub fn innermost(&self) -> &TypeRef {
        match self {
            TypeRef::List(inner) => inner.innermost(),
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{kind}"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub kind: ScalarKind,
    pub required: bool,
}

impl ArgumentDescriptor {
    pub fn required(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            arguments: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: ArgumentDescriptor) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn find_argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }
}

/// Catalog of every object type a query may touch. Built once at startup,
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn type_of(&self, name: &str) -> Result<&TypeDescriptor, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn query_type(&self) -> Result<&TypeDescriptor, SchemaError> {
        self.type_of(QUERY_TYPE)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// `(type, field, target)` for every field naming a type that was never
    /// defined.
    pub fn dangling_references(&self) -> Vec<(String, String, String)> {
        let mut dangling = Vec::new();
        for ty in self.types.values() {
            for field in ty.fields.values() {
                if let TypeRef::Named(target) = field.ty.innermost() {
                    if !self.types.contains_key(target) {
                        dangling.push((ty.name.clone(), field.name.clone(), target.clone()));
                    }
                }
            }
        }
        dangling.sort();
        dangling
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: HashMap<String, TypeDescriptor>,
}

impl SchemaBuilder {
    /// Register an object type. Fields may name types that are defined later;
    /// nothing is checked until a query reaches them. Redefining a name
    /// replaces the earlier definition.
    pub fn define_type(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Self {
        let name = name.into();
        let fields = fields
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect();
        self.types.insert(name.clone(), TypeDescriptor { name, fields });
        self
    }

    pub fn finish(self) -> SchemaRegistry {
        SchemaRegistry { types: self.types }
    }
}

/// The lacrosse statistics schema.
pub fn build_schema() -> SchemaRegistry {
    SchemaRegistry::builder()
        .define_type(
            QUERY_TYPE,
            [
                FieldDescriptor::new("player", TypeRef::named("Player"))
                    .description("Get player by ID")
                    .argument(ArgumentDescriptor::required("id", ScalarKind::String)),
                FieldDescriptor::new("list", TypeRef::list_of(TypeRef::named("Player")))
                    .description("List all players"),
            ],
        )
        .define_type(
            "Player",
            [
                FieldDescriptor::new("id", TypeRef::STRING),
                FieldDescriptor::new("team", TypeRef::named("Team")),
                FieldDescriptor::new("statistics", TypeRef::named("Stats")),
                FieldDescriptor::new("age", TypeRef::INT),
                FieldDescriptor::new("number", TypeRef::STRING),
                FieldDescriptor::new("email", TypeRef::STRING),
            ],
        )
        .define_type(
            "Team",
            [
                FieldDescriptor::new("name", TypeRef::STRING),
                FieldDescriptor::new("wins", TypeRef::INT),
                FieldDescriptor::new("loses", TypeRef::INT),
            ],
        )
        .define_type(
            "Season",
            [FieldDescriptor::new("games", TypeRef::list_of(TypeRef::named("Game")))],
        )
        .define_type(
            "Stats",
            [
                FieldDescriptor::new("goals", TypeRef::INT),
                FieldDescriptor::new("assists", TypeRef::INT),
            ],
        )
        .define_type(
            "Game",
            [
                FieldDescriptor::new("location", TypeRef::STRING),
                FieldDescriptor::new("winner", TypeRef::named("Team")),
            ],
        )
        .finish()
}
