use serde::{Deserialize, Serialize};

use rethread_types::{AuthorCursor, Post, Reply, ThreadCursor};

/// MongoDB-specific Post document (id stored as `_id`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: String,
    pub created_utc: i64,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// MongoDB-specific Reply document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReply {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: String,
    pub created_utc: i64,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAuthorCursor {
    #[serde(rename = "_id")]
    pub author: String,
    pub newest_post: Option<i64>,
    pub newest_reply: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThreadCursor {
    #[serde(rename = "_id")]
    pub thread_id: String,
    pub newest_reply: Option<i64>,
    pub history_complete: bool,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<Post> for MongoPost {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author: post.author,
            created_utc: post.created_utc,
            payload: post.payload,
        }
    }
}

impl From<MongoPost> for Post {
    fn from(post: MongoPost) -> Self {
        Self {
            id: post.id,
            author: post.author,
            created_utc: post.created_utc,
            payload: post.payload,
        }
    }
}

impl From<Reply> for MongoReply {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            author: reply.author,
            created_utc: reply.created_utc,
            thread_id: reply.thread_id,
            parent_id: reply.parent_id,
            payload: reply.payload,
        }
    }
}

impl From<MongoReply> for Reply {
    fn from(reply: MongoReply) -> Self {
        Self {
            id: reply.id,
            author: reply.author,
            created_utc: reply.created_utc,
            thread_id: reply.thread_id,
            parent_id: reply.parent_id,
            payload: reply.payload,
        }
    }
}

impl From<AuthorCursor> for MongoAuthorCursor {
    fn from(cursor: AuthorCursor) -> Self {
        Self {
            author: cursor.author,
            newest_post: cursor.newest_post,
            newest_reply: cursor.newest_reply,
        }
    }
}

impl From<MongoAuthorCursor> for AuthorCursor {
    fn from(cursor: MongoAuthorCursor) -> Self {
        Self {
            author: cursor.author,
            newest_post: cursor.newest_post,
            newest_reply: cursor.newest_reply,
        }
    }
}

impl From<ThreadCursor> for MongoThreadCursor {
    fn from(cursor: ThreadCursor) -> Self {
        Self {
            thread_id: cursor.thread_id,
            newest_reply: cursor.newest_reply,
            history_complete: cursor.history_complete,
        }
    }
}

impl From<MongoThreadCursor> for ThreadCursor {
    fn from(cursor: MongoThreadCursor) -> Self {
        Self {
            thread_id: cursor.thread_id,
            newest_reply: cursor.newest_reply,
            history_complete: cursor.history_complete,
        }
    }
}
