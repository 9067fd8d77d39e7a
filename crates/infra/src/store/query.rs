use serde_json::Value;
use std::cmp::Ordering;

use super::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

/// One condition on a document member, addressed by a path of object keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub path: Vec<String>,
    pub op: Comparison,
    pub value: Value,
}

impl Predicate {
    pub fn new(path: &str, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
            op,
            value: value.into(),
        }
    }

    fn matches(&self, doc: &Value) -> bool {
        let Some(member) = self.path.iter().try_fold(doc, |v, key| v.get(key)) else {
            return false;
        };
        let ord = || compare(member, &self.value);
        match self.op {
            Comparison::Eq => member == &self.value,
            Comparison::Ne => member != &self.value,
            Comparison::Gt => ord() == Some(Ordering::Greater),
            Comparison::Gte => matches!(ord(), Some(Ordering::Greater | Ordering::Equal)),
            Comparison::Lt => ord() == Some(Ordering::Less),
            Comparison::Lte => matches!(ord(), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// Ordering between two JSON scalars of the same kind; anything else is
/// incomparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Ad-hoc query over one collection: documents whose key starts with
/// `key_prefix` and that satisfy every predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateQuery {
    pub key_prefix: Option<String>,
    pub predicates: Vec<Predicate>,
    pub limit: Option<i64>,
}

impl PredicateQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_key_prefix(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        for predicate in &self.predicates {
            if predicate.path.is_empty() || predicate.path.iter().any(String::is_empty) {
                return Err(StoreError::query(format!(
                    "malformed predicate path `{}`",
                    predicate.path.join(".")
                )));
            }
        }
        if matches!(self.limit, Some(limit) if limit < 0) {
            return Err(StoreError::query("limit must not be negative"));
        }
        Ok(())
    }

    pub fn matches(&self, key: &str, doc: &Value) -> bool {
        if let Some(prefix) = &self.key_prefix {
            if !key.starts_with(prefix.as_str()) {
                return false;
            }
        }
        self.predicates.iter().all(|p| p.matches(doc))
    }
}
