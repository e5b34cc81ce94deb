use async_trait::async_trait;
use rethread_types::{AuthorCursor, ItemBatch, Post, Reply, ThreadCursor};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{AuthorItems, ThreadItems};
use crate::store::ItemStore;

#[derive(Default)]
struct State {
    posts: HashMap<String, Post>,
    replies: HashMap<String, Reply>,
    author_cursors: HashMap<String, AuthorCursor>,
    thread_cursors: HashMap<String, ThreadCursor>,
}

/// Process-local `ItemStore`
///
/// Used by tests and as the fallback backend when no database is configured.
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_item_writes: AtomicBool,
    fail_cursor_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `upsert_items` fail until reset
    pub fn fail_item_writes(&self, fail: bool) {
        self.fail_item_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent cursor write fail until reset
    pub fn fail_cursor_writes(&self, fail: bool) {
        self.fail_cursor_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn post_count(&self) -> usize {
        self.state.read().await.posts.len()
    }

    pub async fn reply_count(&self) -> usize {
        self.state.read().await.replies.len()
    }

    fn check_cursor_write(&self, key: &str) -> Result<()> {
        if self.fail_cursor_writes.load(Ordering::SeqCst) {
            return Err(PersistError::WriteFailed(format!("cursor write rejected for {}", key)));
        }
        Ok(())
    }
}

fn sorted_replies<'a>(replies: impl Iterator<Item = &'a Reply>) -> Vec<Reply> {
    let mut replies: Vec<Reply> = replies.cloned().collect();
    replies.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then_with(|| a.id.cmp(&b.id)));
    replies
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn get_author_cursor(&self, author: &str) -> Result<Option<AuthorCursor>> {
        Ok(self.state.read().await.author_cursors.get(author).cloned())
    }

    async fn put_author_cursor(&self, cursor: AuthorCursor) -> Result<()> {
        self.check_cursor_write(&cursor.author)?;
        let mut state = self.state.write().await;
        state.author_cursors.insert(cursor.author.clone(), cursor);
        Ok(())
    }

    async fn get_thread_cursor(&self, thread_id: &str) -> Result<Option<ThreadCursor>> {
        Ok(self.state.read().await.thread_cursors.get(thread_id).cloned())
    }

    async fn put_thread_cursor(&self, cursor: ThreadCursor) -> Result<()> {
        self.check_cursor_write(&cursor.thread_id)?;
        let mut state = self.state.write().await;
        state.thread_cursors.insert(cursor.thread_id.clone(), cursor);
        Ok(())
    }

    async fn upsert_items(&self, batch: ItemBatch) -> Result<()> {
        if self.fail_item_writes.load(Ordering::SeqCst) {
            return Err(PersistError::WriteFailed(format!(
                "upsert of {} {:?} items rejected",
                batch.len(),
                batch.kind()
            )));
        }

        let mut state = self.state.write().await;
        match batch {
            ItemBatch::Posts(posts) => {
                for post in posts {
                    state.posts.insert(post.id.clone(), post);
                }
            }
            ItemBatch::Replies(replies) => {
                for reply in replies {
                    state.replies.insert(reply.id.clone(), reply);
                }
            }
        }
        Ok(())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(post_id).cloned())
    }

    async fn get_thread_items(&self, thread_id: &str) -> Result<ThreadItems> {
        let state = self.state.read().await;
        Ok(ThreadItems {
            post: state.posts.get(thread_id).cloned(),
            replies: sorted_replies(state.replies.values().filter(|r| r.thread_id == thread_id)),
        })
    }

    async fn get_author_items(&self, author: &str) -> Result<AuthorItems> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.author == author)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then_with(|| a.id.cmp(&b.id)));

        Ok(AuthorItems {
            posts,
            replies: sorted_replies(state.replies.values().filter(|r| r.author == author)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_refreshes_payload() {
        let store = InMemoryStore::new();
        let reply = Reply::new("c1", "xyz", "xyz", "bob", 10);

        store.upsert_items(ItemBatch::Replies(vec![reply.clone()])).await.unwrap();
        store
            .upsert_items(ItemBatch::Replies(vec![reply.with_payload(json!({"body": "edited"}))]))
            .await
            .unwrap();

        assert_eq!(store.reply_count().await, 1);
        let items = store.get_thread_items("xyz").await.unwrap();
        assert_eq!(items.replies[0].body(), Some("edited"));
    }

    #[tokio::test]
    async fn test_thread_items_without_post() {
        let store = InMemoryStore::new();
        store
            .upsert_items(ItemBatch::Replies(vec![Reply::new("c3", "abc123", "c2", "alice", 3)]))
            .await
            .unwrap();

        let items = store.get_thread_items("abc123").await.unwrap();
        assert!(items.post.is_none());
        assert_eq!(items.replies.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cursor_write_leaves_previous_value() {
        let store = InMemoryStore::new();
        store.put_thread_cursor(ThreadCursor::new("t")).await.unwrap();

        store.fail_cursor_writes(true);
        let result = store.put_thread_cursor(ThreadCursor::new("t").after_full_fetch(Some(5))).await;
        assert!(matches!(result, Err(PersistError::WriteFailed(_))));

        let cursor = store.get_thread_cursor("t").await.unwrap().unwrap();
        assert!(!cursor.history_complete);
    }
}
