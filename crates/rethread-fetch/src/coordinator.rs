use futures::StreamExt;
use rethread_persist::{AuthorItems, ItemStore};
use rethread_source::{ItemSource, SourceItem};
use rethread_types::{
    AuthorCursor, CacheMode, FetchTarget, ItemBatch, ItemKind, Post, Reply, ThreadCursor, Timestamp,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::CoordinatorConfig;
use crate::cursor::{AuthorCursorTracker, ThreadCursorTracker};
use crate::error::{FetchError, Result};
use crate::lock::KeyLocks;
use crate::plan::{plan_author_fetch, plan_thread_fetch, Completeness, FetchPlan, ScopePlan};

/// Result of an author-scoped fetch
#[derive(Debug, Clone)]
pub struct AuthorFetch {
    pub plan: FetchPlan,
    /// Store view after commit, or the fetched items under `no_cache`
    pub items: AuthorItems,
    /// Cursor as stored once the fetch finished
    pub cursor: Option<AuthorCursor>,
    /// Items received from the source
    pub fetched: usize,
}

/// Result of a thread-scoped fetch
#[derive(Debug, Clone)]
pub struct ThreadFetch {
    pub plan: FetchPlan,
    pub post: Post,
    /// Ordered by creation time, then id
    pub replies: Vec<Reply>,
    pub cursor: Option<ThreadCursor>,
    pub fetched: usize,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Author(AuthorFetch),
    Thread(ThreadFetch),
}

impl FetchOutcome {
    pub fn plan(&self) -> &FetchPlan {
        match self {
            FetchOutcome::Author(fetch) => &fetch.plan,
            FetchOutcome::Thread(fetch) => &fetch.plan,
        }
    }

    pub fn fetched(&self) -> usize {
        match self {
            FetchOutcome::Author(fetch) => fetch.fetched,
            FetchOutcome::Thread(fetch) => fetch.fetched,
        }
    }
}

/// What one listing produced
#[derive(Default)]
struct Drained {
    observed: Option<Timestamp>,
    /// Only kept when the plan does not persist
    items: Vec<SourceItem>,
    count: usize,
}

/// Decides and executes cache-aware fetches.
///
/// Every fetch resolves its plan, consumes the source, writes items and
/// finally writes cursors while holding the lock for its target key, so
/// concurrent requests for the same author or thread run one after the
/// other and each sees the cursor its predecessor committed.
pub struct FetchCoordinator {
    store: Arc<dyn ItemStore>,
    source: Arc<dyn ItemSource>,
    authors: AuthorCursorTracker,
    threads: ThreadCursorTracker,
    locks: KeyLocks,
    config: CoordinatorConfig,
}

impl FetchCoordinator {
    pub fn new(store: Arc<dyn ItemStore>, source: Arc<dyn ItemSource>) -> Self {
        Self {
            authors: AuthorCursorTracker::new(Arc::clone(&store)),
            threads: ThreadCursorTracker::new(Arc::clone(&store)),
            store,
            source,
            locks: KeyLocks::new(),
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    pub fn author_cursors(&self) -> &AuthorCursorTracker {
        &self.authors
    }

    pub fn thread_cursors(&self) -> &ThreadCursorTracker {
        &self.threads
    }

    /// Plan an author fetch against the currently stored cursor. No I/O
    /// besides the cursor read.
    pub async fn resolve_author_fetch(&self, author: &str, mode: CacheMode) -> Result<FetchPlan> {
        let _guard = self.locks.acquire(&FetchTarget::author(author).lock_key()).await;
        let cursor = self.authors.current(author).await?;
        Ok(plan_author_fetch(author, mode, cursor.as_ref()))
    }

    /// Plan a thread fetch against the currently stored cursor
    pub async fn resolve_thread_fetch(&self, thread_id: &str, mode: CacheMode) -> Result<FetchPlan> {
        let _guard = self.locks.acquire(&FetchTarget::thread(thread_id).lock_key()).await;
        let cursor = self.threads.current(thread_id).await?;
        Ok(plan_thread_fetch(thread_id, mode, cursor.as_ref()))
    }

    pub async fn fetch(&self, target: &FetchTarget, mode: CacheMode) -> Result<FetchOutcome> {
        match target {
            FetchTarget::Author(author) => Ok(FetchOutcome::Author(self.fetch_author(author, mode).await?)),
            FetchTarget::Thread(thread_id) => Ok(FetchOutcome::Thread(self.fetch_thread(thread_id, mode).await?)),
        }
    }

    /// Same as `fetch` with the mode given by name or legacy code
    pub async fn fetch_with_mode(&self, target: &FetchTarget, mode: &str) -> Result<FetchOutcome> {
        let mode: CacheMode = mode.parse()?;
        self.fetch(target, mode).await
    }

    /// Fetch everything an author wrote. Never touches thread cursors.
    pub async fn fetch_author(&self, author: &str, mode: CacheMode) -> Result<AuthorFetch> {
        let _guard = self.locks.acquire(&FetchTarget::author(author).lock_key()).await;

        let cursor = self.authors.current(author).await?;
        let plan = plan_author_fetch(author, mode, cursor.as_ref());
        tracing::info!(
            "Author {} fetch ({}): {:?}, posts after {:?}, replies after {:?}",
            author,
            mode,
            plan.strategy,
            plan.lower_bound(ItemKind::Post),
            plan.lower_bound(ItemKind::Reply)
        );

        if !plan.calls_source() {
            let items = self.read_author_items(author).await?;
            return Ok(AuthorFetch { plan, items, cursor, fetched: 0 });
        }

        let mut observed_post = None;
        let mut observed_reply = None;
        let mut fetched = Vec::new();
        let mut count = 0;

        for scope in &plan.scopes {
            let drained = self.drain(scope, plan.persist).await?;
            match scope.scope.item_kind() {
                ItemKind::Post => observed_post = drained.observed,
                ItemKind::Reply => observed_reply = drained.observed,
            }
            count += drained.count;
            fetched.extend(drained.items);
        }

        if !plan.persist {
            let (posts, replies) = dedup_items(fetched);
            return Ok(AuthorFetch {
                plan,
                items: AuthorItems { posts, replies },
                cursor,
                fetched: count,
            });
        }

        let cursor = self
            .authors
            .commit(author, observed_post, observed_reply)
            .await
            .inspect_err(|e| tracing::error!("Author cursor commit for {} failed: {}", author, e))?;
        let items = self.read_author_items(author).await?;

        tracing::info!(
            "Author {} fetch done: {} fetched, {} posts and {} replies cached",
            author,
            count,
            items.posts.len(),
            items.replies.len()
        );

        Ok(AuthorFetch {
            plan,
            items,
            cursor: Some(cursor),
            fetched: count,
        })
    }

    /// Fetch a thread's post and replies. Only a full fetch may mark the
    /// thread complete.
    pub async fn fetch_thread(&self, thread_id: &str, mode: CacheMode) -> Result<ThreadFetch> {
        let _guard = self.locks.acquire(&FetchTarget::thread(thread_id).lock_key()).await;

        let cursor = self.threads.current(thread_id).await?;
        let plan = plan_thread_fetch(thread_id, mode, cursor.as_ref());
        tracing::info!(
            "Thread {} fetch ({}): {:?} from {:?}",
            thread_id,
            mode,
            plan.strategy,
            plan.lower_bound(ItemKind::Reply)
        );

        let post = self.resolve_post(thread_id, &plan).await?;

        if !plan.calls_source() {
            let replies = self.read_thread_replies(thread_id).await?;
            return Ok(ThreadFetch { plan, post, replies, cursor, fetched: 0 });
        }

        let mut drained = Drained::default();
        for scope in &plan.scopes {
            let next = self.drain(scope, plan.persist).await?;
            drained.observed = drained.observed.max(next.observed);
            drained.count += next.count;
            drained.items.extend(next.items);
        }

        if !plan.persist {
            let (_, replies) = dedup_items(drained.items);
            return Ok(ThreadFetch {
                plan,
                post,
                replies,
                cursor,
                fetched: drained.count,
            });
        }

        let committed = match plan.completeness {
            Completeness::MarkComplete => Some(self.threads.commit_full(thread_id, drained.observed).await),
            Completeness::RetainComplete => Some(self.threads.commit_incremental(thread_id, drained.observed).await),
            Completeness::Untouched => None,
        };
        let cursor = match committed {
            Some(Ok(cursor)) => Some(cursor),
            Some(Err(e)) => {
                tracing::error!("Thread cursor commit for {} failed: {}", thread_id, e);
                return Err(e);
            }
            None => cursor,
        };

        let replies = self.read_thread_replies(thread_id).await?;
        tracing::info!(
            "Thread {} fetch done: {} fetched, {} replies cached",
            thread_id,
            drained.count,
            replies.len()
        );

        Ok(ThreadFetch {
            plan,
            post,
            replies,
            cursor,
            fetched: drained.count,
        })
    }

    /// Forced override: the thread's cache can no longer be trusted as
    /// complete. Returns the updated cursor, `None` if the thread was never
    /// fetched.
    pub async fn invalidate_thread(&self, thread_id: &str) -> Result<Option<ThreadCursor>> {
        let _guard = self.locks.acquire(&FetchTarget::thread(thread_id).lock_key()).await;
        let cursor = self.threads.invalidate(thread_id).await?;
        if cursor.is_some() {
            tracing::info!("Thread {} marked incomplete", thread_id);
        }
        Ok(cursor)
    }

    /// Post for a thread. Persisting default fetches trust the cache;
    /// `full_save` and `no_cache` go to the source first.
    async fn resolve_post(&self, thread_id: &str, plan: &FetchPlan) -> Result<Post> {
        let source_first = matches!(plan.mode, CacheMode::FullSave | CacheMode::NoCache);

        if !source_first {
            if let Some(post) = self.read_post(thread_id).await? {
                return Ok(post);
            }
        }

        if plan.calls_source() {
            if let Some(post) = self.source.fetch_post(thread_id).await? {
                if plan.persist {
                    self.write(ItemBatch::Posts(vec![post.clone()])).await?;
                }
                return Ok(post);
            }
        }

        if source_first {
            if let Some(post) = self.read_post(thread_id).await? {
                return Ok(post);
            }
        }

        Err(FetchError::PostNotFound(thread_id.to_string()))
    }

    /// Consume one listing. Persisting plans write items in batches as they
    /// arrive; on a source failure the buffered items are still written and
    /// the error is returned.
    async fn drain(&self, plan: &ScopePlan, persist: bool) -> Result<Drained> {
        let mut stream = self
            .source
            .list_items(plan.scope.clone(), plan.lower_bound)
            .await?;

        let mut drained = Drained::default();
        let mut buffer = Vec::with_capacity(self.config.upsert_batch_size);

        while let Some(next) = stream.next().await {
            let item = match next {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(
                        "Listing {} failed after {} items: {}",
                        plan.scope,
                        drained.count,
                        e
                    );
                    if persist {
                        if let Err(write_err) = self.flush(&mut buffer).await {
                            tracing::error!("Could not keep partial items of {}: {}", plan.scope, write_err);
                        }
                    }
                    return Err(FetchError::SourceUnavailable(e));
                }
            };

            let created = item.created_utc();
            if plan.lower_bound.is_some_and(|bound| created < bound) {
                tracing::debug!("Skipping {} below lower bound", item.id());
                continue;
            }

            drained.count += 1;
            drained.observed = drained.observed.max(Some(created));

            if persist {
                buffer.push(item);
                if buffer.len() >= self.config.upsert_batch_size {
                    self.flush(&mut buffer).await?;
                }
            } else {
                drained.items.push(item);
            }
        }

        if persist {
            self.flush(&mut buffer).await?;
        }

        tracing::debug!("Listing {} yielded {} items", plan.scope, drained.count);
        Ok(drained)
    }

    async fn flush(&self, buffer: &mut Vec<SourceItem>) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let mut posts = Vec::new();
        let mut replies = Vec::new();
        for item in buffer.drain(..) {
            match item {
                SourceItem::Post(post) => posts.push(post),
                SourceItem::Reply(reply) => replies.push(reply),
            }
        }

        if !posts.is_empty() {
            self.write(ItemBatch::Posts(posts)).await?;
        }
        if !replies.is_empty() {
            self.write(ItemBatch::Replies(replies)).await?;
        }
        Ok(())
    }

    async fn write(&self, batch: ItemBatch) -> Result<()> {
        let len = batch.len();
        let kind = batch.kind();
        self.store
            .upsert_items(batch)
            .await
            .map_err(FetchError::StoreWriteFailed)?;
        tracing::debug!("Upserted {} {:?} items", len, kind);
        Ok(())
    }

    async fn read_post(&self, post_id: &str) -> Result<Option<Post>> {
        self.store.get_post(post_id).await.map_err(FetchError::StoreReadFailed)
    }

    async fn read_author_items(&self, author: &str) -> Result<AuthorItems> {
        self.store
            .get_author_items(author)
            .await
            .map_err(FetchError::StoreReadFailed)
    }

    async fn read_thread_replies(&self, thread_id: &str) -> Result<Vec<Reply>> {
        self.store
            .get_thread_items(thread_id)
            .await
            .map(|items| items.replies)
            .map_err(FetchError::StoreReadFailed)
    }
}

/// Split fetched items by kind, last copy of an id wins, ordered by time then id
fn dedup_items(items: Vec<SourceItem>) -> (Vec<Post>, Vec<Reply>) {
    let mut posts: HashMap<String, Post> = HashMap::new();
    let mut replies: HashMap<String, Reply> = HashMap::new();

    for item in items {
        match item {
            SourceItem::Post(post) => {
                posts.insert(post.id.clone(), post);
            }
            SourceItem::Reply(reply) => {
                replies.insert(reply.id.clone(), reply);
            }
        }
    }

    let mut posts: Vec<Post> = posts.into_values().collect();
    posts.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then_with(|| a.id.cmp(&b.id)));
    let mut replies: Vec<Reply> = replies.into_values().collect();
    replies.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then_with(|| a.id.cmp(&b.id)));

    (posts, replies)
}
