use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation time in seconds since the Unix epoch, as reported by the source
pub type Timestamp = i64;

/// Top-level post. A post is its own thread: `thread_id() == id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub created_utc: Timestamp,
    /// Raw item as returned by the source; refreshed on every re-fetch
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Post {
    pub fn new(id: impl Into<String>, author: impl Into<String>, created_utc: Timestamp) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            created_utc,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn thread_id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_utc, 0)
    }

    pub fn title(&self) -> Option<&str> {
        self.payload_str("title")
    }

    pub fn body(&self) -> Option<&str> {
        self.payload_str("selftext")
    }

    pub fn url(&self) -> Option<&str> {
        self.payload_str("url")
    }

    pub fn community(&self) -> Option<&str> {
        self.payload_str("subreddit")
    }

    pub fn score(&self) -> Option<i64> {
        self.payload.get("score").and_then(|v| v.as_i64())
    }

    fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// Reply inside a thread. `parent_id` is either the thread's post id or
/// another reply's id; it is resolved only when a tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub created_utc: Timestamp,
    pub thread_id: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Reply {
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        parent_id: impl Into<String>,
        author: impl Into<String>,
        created_utc: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            created_utc,
            thread_id: thread_id.into(),
            parent_id: Some(parent_id.into()),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// True when the reply answers the post directly
    pub fn is_top_level(&self) -> bool {
        self.parent_id.as_deref() == Some(self.thread_id.as_str())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_utc, 0)
    }

    pub fn body(&self) -> Option<&str> {
        self.payload.get("body").and_then(|v| v.as_str())
    }

    pub fn score(&self) -> Option<i64> {
        self.payload.get("score").and_then(|v| v.as_i64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Reply,
}

/// A homogeneous group of items handed to the store in one upsert
#[derive(Debug, Clone, PartialEq)]
pub enum ItemBatch {
    Posts(Vec<Post>),
    Replies(Vec<Reply>),
}

impl ItemBatch {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemBatch::Posts(_) => ItemKind::Post,
            ItemBatch::Replies(_) => ItemKind::Reply,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ItemBatch::Posts(posts) => posts.len(),
            ItemBatch::Replies(replies) => replies.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Newest creation time in the batch
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        match self {
            ItemBatch::Posts(posts) => posts.iter().map(|p| p.created_utc).max(),
            ItemBatch::Replies(replies) => replies.iter().map(|r| r.created_utc).max(),
        }
    }
}
