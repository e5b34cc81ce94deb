//! Prelude module for convenient imports
//!
//! ```rust
//! use rethread::prelude::*;
//! ```

pub use crate::{
    Post, Reply, AuthorCursor, ThreadCursor, CacheMode, FetchTarget,
    ItemStore, InMemoryStore,
    ItemSource, PullPushClient, PullPushConfig, MemorySource,
    FetchCoordinator, CoordinatorConfig, FetchPlan, FetchStrategy, FetchOutcome, FetchError,
    build, render_thread, ReplyForest, ReplyNode, TreeError,
};
