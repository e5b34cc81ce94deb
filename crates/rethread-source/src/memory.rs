use async_stream::try_stream;
use async_trait::async_trait;
use rethread_types::{Post, Reply, Timestamp};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, SourceError};
use crate::traits::{ItemSource, ItemStream, SourceItem, SourceScope};

/// How a scripted listing breaks down
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Yield this error
    Error(String),
    /// Never produce another item
    Hang,
}

#[derive(Default)]
struct Data {
    posts: HashMap<String, Post>,
    replies: Vec<Reply>,
    failures: HashMap<SourceScope, (usize, Failure)>,
}

/// Scripted `ItemSource` for tests and offline runs
///
/// Serves the posts and replies it was given, in ascending time order, and
/// records every listing call so callers can assert on the lower bounds used.
#[derive(Default)]
pub struct MemorySource {
    data: Mutex<Data>,
    calls: Mutex<Vec<(SourceScope, Option<Timestamp>)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post(self, post: Post) -> Self {
        self.push_post(post);
        self
    }

    pub fn with_replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        for reply in replies {
            self.push_reply(reply);
        }
        self
    }

    /// Listings of `scope` fail after yielding `after` items
    pub fn with_failure(self, scope: SourceScope, after: usize, failure: Failure) -> Self {
        self.set_failure(scope, after, failure);
        self
    }

    pub fn push_post(&self, post: Post) {
        self.data().posts.insert(post.id.clone(), post);
    }

    /// Add or replace a reply; later listings see it
    pub fn push_reply(&self, reply: Reply) {
        let mut data = self.data();
        data.replies.retain(|existing| existing.id != reply.id);
        data.replies.push(reply);
    }

    pub fn set_failure(&self, scope: SourceScope, after: usize, failure: Failure) {
        self.data().failures.insert(scope, (after, failure));
    }

    pub fn clear_failures(&self) {
        self.data().failures.clear();
    }

    /// Listing calls made so far, with the lower bound each one used
    pub fn calls(&self) -> Vec<(SourceScope, Option<Timestamp>)> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_call(&self, scope: &SourceScope, lower_bound: Option<Timestamp>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((scope.clone(), lower_bound));
        }
    }

    fn matching(&self, scope: &SourceScope, lower_bound: Option<Timestamp>) -> Vec<SourceItem> {
        let data = self.data();
        let mut items: Vec<SourceItem> = match scope {
            SourceScope::AuthorPosts(author) => data
                .posts
                .values()
                .filter(|post| &post.author == author)
                .cloned()
                .map(SourceItem::Post)
                .collect(),
            SourceScope::AuthorReplies(author) => data
                .replies
                .iter()
                .filter(|reply| &reply.author == author)
                .cloned()
                .map(SourceItem::Reply)
                .collect(),
            SourceScope::ThreadReplies(thread_id) => data
                .replies
                .iter()
                .filter(|reply| &reply.thread_id == thread_id)
                .cloned()
                .map(SourceItem::Reply)
                .collect(),
        };

        items.retain(|item| lower_bound.map_or(true, |bound| item.created_utc() >= bound));
        items.sort_by(|a, b| {
            a.created_utc()
                .cmp(&b.created_utc())
                .then_with(|| a.id().cmp(b.id()))
        });
        items
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>> {
        Ok(self.data().posts.get(post_id).cloned())
    }

    async fn list_items(&self, scope: SourceScope, lower_bound: Option<Timestamp>) -> Result<ItemStream> {
        self.record_call(&scope, lower_bound);

        let items = self.matching(&scope, lower_bound);
        let failure = self.data().failures.get(&scope).cloned();

        let stream = try_stream! {
            for (index, item) in items.into_iter().enumerate() {
                if let Some((after, failure)) = &failure {
                    if index == *after {
                        match failure {
                            Failure::Error(message) => {
                                Err::<(), _>(SourceError::Unavailable(message.clone()))?;
                            }
                            Failure::Hang => futures::future::pending::<()>().await,
                        }
                    }
                }
                yield item;
            }

            // A failure placed past the last item still fires
            if let Some((_, failure)) = failure {
                match failure {
                    Failure::Error(message) => {
                        Err::<(), _>(SourceError::Unavailable(message))?;
                    }
                    Failure::Hang => futures::future::pending::<()>().await,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_post(Post::new("abc123", "op", 100))
            .with_replies(vec![
                Reply::new("c2", "abc123", "c1", "bob", 102),
                Reply::new("c1", "abc123", "abc123", "op", 101),
                Reply::new("c3", "abc123", "c2", "alice", 103),
                Reply::new("z9", "other", "other", "alice", 50),
            ])
    }

    #[tokio::test]
    async fn test_thread_listing_is_ordered_and_bounded() {
        let source = source();
        let stream = source
            .list_items(SourceScope::ThreadReplies("abc123".into()), Some(102))
            .await
            .unwrap();
        let ids: Vec<String> = stream.map(|item| item.unwrap().id().to_string()).collect().await;

        assert_eq!(ids, vec!["c2", "c3"]);
        assert_eq!(
            source.calls(),
            vec![(SourceScope::ThreadReplies("abc123".into()), Some(102))]
        );
    }

    #[tokio::test]
    async fn test_author_listing_spans_threads() {
        let source = source();
        let stream = source
            .list_items(SourceScope::AuthorReplies("alice".into()), None)
            .await
            .unwrap();
        let ids: Vec<String> = stream.map(|item| item.unwrap().id().to_string()).collect().await;

        assert_eq!(ids, vec!["z9", "c3"]);
    }

    #[tokio::test]
    async fn test_failure_after_items() {
        let source = source().with_failure(
            SourceScope::ThreadReplies("abc123".into()),
            1,
            Failure::Error("archive down".into()),
        );
        let results: Vec<_> = source
            .list_items(SourceScope::ThreadReplies("abc123".into()), None)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_fetch_post() {
        let source = source();
        let post = tokio_test::block_on(source.fetch_post("abc123")).unwrap();
        assert_eq!(post.map(|p| p.author), Some("op".to_string()));
        assert!(tokio_test::block_on(source.fetch_post("missing")).unwrap().is_none());
    }
}
