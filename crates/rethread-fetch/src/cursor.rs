use rethread_persist::ItemStore;
use rethread_types::{AuthorCursor, ItemKind, ThreadCursor, Timestamp};
use std::sync::Arc;

use crate::error::{FetchError, Result};

/// Per-author watermarks (Contribution Cursor Tracker)
#[derive(Clone)]
pub struct AuthorCursorTracker {
    store: Arc<dyn ItemStore>,
}

impl AuthorCursorTracker {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn current(&self, author: &str) -> Result<Option<AuthorCursor>> {
        self.store
            .get_author_cursor(author)
            .await
            .map_err(FetchError::StoreReadFailed)
    }

    /// Merge observed maxima into the stored watermarks. Must only be called
    /// once the items behind `observed_*` are durable.
    pub async fn commit(
        &self,
        author: &str,
        observed_post: Option<Timestamp>,
        observed_reply: Option<Timestamp>,
    ) -> Result<AuthorCursor> {
        let stored = self.current(author).await?;
        let cursor = stored
            .clone()
            .unwrap_or_else(|| AuthorCursor::new(author))
            .advanced(ItemKind::Post, observed_post)
            .advanced(ItemKind::Reply, observed_reply);

        if stored.as_ref() == Some(&cursor) {
            tracing::debug!("Author cursor for {} unchanged", author);
            return Ok(cursor);
        }

        self.store
            .put_author_cursor(cursor.clone())
            .await
            .map_err(FetchError::StoreWriteFailed)?;

        tracing::info!(
            "Author cursor for {} advanced to posts={:?} replies={:?}",
            author,
            cursor.newest_post,
            cursor.newest_reply
        );
        Ok(cursor)
    }
}

/// Per-thread watermark and history-complete flag (Thread Cursor Tracker)
#[derive(Clone)]
pub struct ThreadCursorTracker {
    store: Arc<dyn ItemStore>,
}

impl ThreadCursorTracker {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn current(&self, thread_id: &str) -> Result<Option<ThreadCursor>> {
        self.store
            .get_thread_cursor(thread_id)
            .await
            .map_err(FetchError::StoreReadFailed)
    }

    /// Record a successful full fetch: the flag becomes true
    pub async fn commit_full(&self, thread_id: &str, observed: Option<Timestamp>) -> Result<ThreadCursor> {
        let cursor = self
            .current(thread_id)
            .await?
            .unwrap_or_else(|| ThreadCursor::new(thread_id))
            .after_full_fetch(observed);

        self.put(cursor).await
    }

    /// Record a successful incremental fetch: only the watermark moves
    pub async fn commit_incremental(&self, thread_id: &str, observed: Option<Timestamp>) -> Result<ThreadCursor> {
        let stored = self.current(thread_id).await?;
        let cursor = stored
            .clone()
            .unwrap_or_else(|| ThreadCursor::new(thread_id))
            .after_incremental(observed);

        if stored.as_ref() == Some(&cursor) {
            tracing::debug!("Thread cursor for {} unchanged", thread_id);
            return Ok(cursor);
        }

        self.put(cursor).await
    }

    /// Reset the flag so the next default fetch starts from scratch. The
    /// watermark is kept. Returns `None` when the thread was never fetched.
    pub async fn invalidate(&self, thread_id: &str) -> Result<Option<ThreadCursor>> {
        match self.current(thread_id).await? {
            Some(cursor) => {
                let cursor = self.put(cursor.invalidated()).await?;
                Ok(Some(cursor))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, cursor: ThreadCursor) -> Result<ThreadCursor> {
        self.store
            .put_thread_cursor(cursor.clone())
            .await
            .map_err(FetchError::StoreWriteFailed)?;

        tracing::info!(
            "Thread cursor for {} set to newest={:?} complete={}",
            cursor.thread_id,
            cursor.newest_reply,
            cursor.history_complete
        );
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rethread_persist::InMemoryStore;

    #[tokio::test]
    async fn test_author_commit_never_moves_backwards() {
        let store: Arc<dyn ItemStore> = Arc::new(InMemoryStore::new());
        let tracker = AuthorCursorTracker::new(store);

        tracker.commit("alice", Some(100), Some(200)).await.unwrap();
        let cursor = tracker.commit("alice", Some(50), None).await.unwrap();

        assert_eq!(cursor.newest_post, Some(100));
        assert_eq!(cursor.newest_reply, Some(200));
    }

    #[tokio::test]
    async fn test_incremental_keeps_flag_and_invalidate_clears_it() {
        let store: Arc<dyn ItemStore> = Arc::new(InMemoryStore::new());
        let tracker = ThreadCursorTracker::new(store);

        tracker.commit_full("abc123", Some(10)).await.unwrap();
        let cursor = tracker.commit_incremental("abc123", Some(20)).await.unwrap();
        assert!(cursor.history_complete);
        assert_eq!(cursor.newest_reply, Some(20));

        let cursor = tracker.invalidate("abc123").await.unwrap().unwrap();
        assert!(!cursor.history_complete);
        assert_eq!(cursor.newest_reply, Some(20));

        assert!(tracker.invalidate("never-seen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_full_fetch_marks_complete() {
        let store: Arc<dyn ItemStore> = Arc::new(InMemoryStore::new());
        let tracker = ThreadCursorTracker::new(store);

        let cursor = tracker.commit_full("quiet", None).await.unwrap();
        assert!(cursor.history_complete);
        assert_eq!(cursor.newest_reply, None);
    }
}
