//! # Rethread
//!
//! Incremental caching of Reddit authors and threads, with reply trees
//! rebuilt from whatever the cache holds.
//!
//! ## Overview
//!
//! - **Fetch by author or by thread** from the PullPush archive, with four
//!   cache modes (`default`, `no_cache`, `cache_only`, `full_save`)
//! - **Track completeness per thread**: only a full thread fetch marks a
//!   thread's replies as completely cached, so replies cached through an
//!   author fetch never cut a later thread fetch short
//! - **Serialize fetches per key**: concurrent requests for the same author
//!   or thread run one after the other
//! - **Rebuild reply trees** with orphans kept apart and cycles rejected
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rethread::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let source = Arc::new(PullPushClient::new(PullPushConfig::default())?);
//!     let coordinator = FetchCoordinator::new(store, source);
//!
//!     let thread = coordinator.fetch_thread("abc123", CacheMode::Default).await?;
//!     let forest = build("abc123", &thread.post, &thread.replies)?;
//!     println!("{}", render_thread(&thread.post, &forest));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`rethread-types`**: posts, replies, cursors, cache modes
//! - **`rethread-persist`**: item store contract, in-memory and MongoDB stores
//! - **`rethread-source`**: item source contract, PullPush client, scripted source
//! - **`rethread-fetch`**: fetch plans, cursor trackers, fetch coordinator
//! - **`rethread-tree`**: reply tree builder and thread document rendering
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use rethread_types::{
    AuthorCursor, CacheMode, FetchTarget, InvalidModeError, ItemBatch, ItemKind, Post, Reply,
    ThreadCursor, Timestamp,
};

pub use rethread_persist::{AuthorItems, InMemoryStore, ItemStore, PersistError, ThreadItems};

#[cfg(feature = "mongodb")]
pub use rethread_persist::MongoItemStore;

pub use rethread_source::{
    Failure, ItemSource, ItemStream, MemorySource, PullPushClient, PullPushConfig, SourceError,
    SourceItem, SourceScope,
};

pub use rethread_fetch::{
    plan_author_fetch, plan_thread_fetch, AuthorCursorTracker, AuthorFetch, Completeness,
    CoordinatorConfig, FetchCoordinator, FetchError, FetchOutcome, FetchPlan, FetchStrategy,
    ScopePlan, ThreadCursorTracker, ThreadFetch,
};

pub use rethread_tree::{
    build, render_thread, Inconsistency, ReplyForest, ReplyNode, ThreadMetadata, TreeError,
};
