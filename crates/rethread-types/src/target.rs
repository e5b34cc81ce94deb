use serde::{Deserialize, Serialize};
use std::fmt;

/// What a fetch request is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum FetchTarget {
    Author(String),
    Thread(String),
}

impl FetchTarget {
    pub fn author(name: impl Into<String>) -> Self {
        FetchTarget::Author(name.into())
    }

    pub fn thread(id: impl Into<String>) -> Self {
        FetchTarget::Thread(id.into())
    }

    /// Key under which fetch-and-commit sequences are serialized
    pub fn lock_key(&self) -> String {
        match self {
            FetchTarget::Author(name) => format!("author:{}", name),
            FetchTarget::Thread(id) => format!("thread:{}", id),
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Author(name) => write!(f, "author {}", name),
            FetchTarget::Thread(id) => write!(f, "thread {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_keys_do_not_collide_across_kinds() {
        let author = FetchTarget::author("abc123");
        let thread = FetchTarget::thread("abc123");
        assert_ne!(author.lock_key(), thread.lock_key());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&FetchTarget::thread("xyz")).unwrap();
        assert_eq!(json, r#"{"type":"thread","id":"xyz"}"#);
    }
}
