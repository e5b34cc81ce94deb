use async_trait::async_trait;
use rethread_types::{AuthorCursor, ItemBatch, Post, ThreadCursor};

use crate::error::Result;
use crate::models::{AuthorItems, ThreadItems};

/// Durable keyed storage for posts, replies and the two cache-status records
///
/// Every operation is atomic for a single key. A successful `upsert_items`
/// must be durable before it returns: callers write cursors only after the
/// items they cover, so a cursor never points past data that was not stored.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_author_cursor(&self, author: &str) -> Result<Option<AuthorCursor>>;

    async fn put_author_cursor(&self, cursor: AuthorCursor) -> Result<()>;

    async fn get_thread_cursor(&self, thread_id: &str) -> Result<Option<ThreadCursor>>;

    async fn put_thread_cursor(&self, cursor: ThreadCursor) -> Result<()>;

    /// Insert or replace items by id
    async fn upsert_items(&self, batch: ItemBatch) -> Result<()>;

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>>;

    /// Post and replies cached for a thread, replies ordered by creation time
    async fn get_thread_items(&self, thread_id: &str) -> Result<ThreadItems>;

    /// Posts and replies cached for an author, ordered by creation time
    async fn get_author_items(&self, author: &str) -> Result<AuthorItems>;
}
