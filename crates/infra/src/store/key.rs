use std::fmt;

/// Prefix of player documents inside a shared collection.
pub const PLAYER_PREFIX: &str = "u";

const SEPARATOR: char = ':';

/// Store-wide document key, `<kind-prefix>:<entity-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(prefix: &str, id: &str) -> Self {
        Self(format!("{prefix}{SEPARATOR}{id}"))
    }

    pub fn player(id: &str) -> Self {
        Self::new(PLAYER_PREFIX, id)
    }

    /// The part of a key shared by every document of one kind, e.g. `u:`.
    pub fn kind_prefix(prefix: &str) -> String {
        format!("{prefix}{SEPARATOR}")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into `(prefix, id)`.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once(SEPARATOR)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
