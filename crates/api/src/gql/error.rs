use infra::StoreError;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Error returned by a bound resolver. The executor reports it as a
/// `ResolverFailure` at the field's path.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Custom(String),
}

impl ResolverError {
    pub fn new(msg: impl Into<String>) -> Self {
        ResolverError::Custom(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a field in the response, rendered as `list[2].team.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The query is not a parsable document or not a query operation.
    Syntax,
    UnknownType,
    UnknownField,
    InvalidArgument,
    InvalidSelection,
    ResolverFailure,
}

/// One entry of the response's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
    #[serde(skip)]
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.segments().is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}
