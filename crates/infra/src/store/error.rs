use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot connect to document store: {0}")]
    Connection(String),

    #[error("cannot open collection `{name}`: {reason}")]
    Collection { name: String, reason: String },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store read failed: {0}")]
    Read(String),

    #[error("store write failed: {0}")]
    Write(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn collection(name: &str, reason: impl ToString) -> Self {
        StoreError::Collection {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn read(e: impl ToString) -> Self {
        StoreError::Read(e.to_string())
    }

    pub fn write(e: impl ToString) -> Self {
        StoreError::Write(e.to_string())
    }

    pub fn query(e: impl ToString) -> Self {
        StoreError::Query(e.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
