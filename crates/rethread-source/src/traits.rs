use async_trait::async_trait;
use futures::Stream;
use rethread_types::{ItemKind, Post, Reply, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

use crate::error::Result;

/// Lazy, ascending-by-timestamp sequence of items. Ends on exhaustion or
/// on the first error.
pub type ItemStream = Pin<Box<dyn Stream<Item = Result<SourceItem>> + Send>>;

/// What a listing covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "key", rename_all = "snake_case")]
pub enum SourceScope {
    /// Every post written by an author
    AuthorPosts(String),
    /// Every reply written by an author, across all threads
    AuthorReplies(String),
    /// Every reply of one thread, regardless of author
    ThreadReplies(String),
}

impl SourceScope {
    pub fn item_kind(&self) -> ItemKind {
        match self {
            SourceScope::AuthorPosts(_) => ItemKind::Post,
            SourceScope::AuthorReplies(_) | SourceScope::ThreadReplies(_) => ItemKind::Reply,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SourceScope::AuthorPosts(key)
            | SourceScope::AuthorReplies(key)
            | SourceScope::ThreadReplies(key) => key,
        }
    }
}

impl fmt::Display for SourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceScope::AuthorPosts(author) => write!(f, "posts of {}", author),
            SourceScope::AuthorReplies(author) => write!(f, "replies of {}", author),
            SourceScope::ThreadReplies(thread) => write!(f, "replies in thread {}", thread),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceItem {
    Post(Post),
    Reply(Reply),
}

impl SourceItem {
    pub fn id(&self) -> &str {
        match self {
            SourceItem::Post(post) => &post.id,
            SourceItem::Reply(reply) => &reply.id,
        }
    }

    pub fn created_utc(&self) -> Timestamp {
        match self {
            SourceItem::Post(post) => post.created_utc,
            SourceItem::Reply(reply) => reply.created_utc,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            SourceItem::Post(_) => ItemKind::Post,
            SourceItem::Reply(_) => ItemKind::Reply,
        }
    }
}

/// External origin of posts and replies
///
/// Implementations own rate limiting, retries and timeouts. Callers only
/// decide the scope and the lower bound.
#[async_trait]
pub trait ItemSource: Send + Sync {
    fn name(&self) -> &str;

    /// Single post by id, `None` when the source does not know it
    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>>;

    /// Items of `scope` created at or after `lower_bound` (everything when `None`)
    async fn list_items(&self, scope: SourceScope, lower_bound: Option<Timestamp>) -> Result<ItemStream>;
}
