use rethread_source::SourceScope;
use rethread_types::{AuthorCursor, CacheMode, FetchTarget, ItemKind, ThreadCursor, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Serve the cache as is, never call the source
    CacheOnly,
    /// Everything from the beginning of time
    Full,
    /// Only items at or after a stored watermark
    Incremental,
}

/// What a successful execution does to the thread's history-complete flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// No thread cursor is written
    Untouched,
    /// Set the flag: every reply of the thread was retrieved
    MarkComplete,
    /// Keep the flag as stored; only the watermark moves
    RetainComplete,
}

/// One source listing within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePlan {
    pub scope: SourceScope,
    /// Inclusive; `None` means from the beginning of time
    pub lower_bound: Option<Timestamp>,
}

/// Decision for a single fetch request, made before any source call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPlan {
    pub target: FetchTarget,
    pub mode: CacheMode,
    pub strategy: FetchStrategy,
    /// Listings to run, in order; empty for cache-only plans
    pub scopes: Vec<ScopePlan>,
    /// Whether fetched items and cursors are written to the store
    pub persist: bool,
    pub completeness: Completeness,
}

impl FetchPlan {
    pub fn calls_source(&self) -> bool {
        !self.scopes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.strategy == FetchStrategy::Full
    }

    pub fn is_incremental(&self) -> bool {
        self.strategy == FetchStrategy::Incremental
    }

    pub fn lower_bound(&self, kind: ItemKind) -> Option<Timestamp> {
        self.scopes
            .iter()
            .find(|plan| plan.scope.item_kind() == kind)
            .and_then(|plan| plan.lower_bound)
    }
}

/// Plan for an author-scoped fetch given the stored author cursor.
///
/// Author plans never carry a completeness effect: an author's items say
/// nothing about whether any thread they touch is fully cached.
pub fn plan_author_fetch(author: &str, mode: CacheMode, cursor: Option<&AuthorCursor>) -> FetchPlan {
    let target = FetchTarget::author(author);
    let scopes = |posts: Option<Timestamp>, replies: Option<Timestamp>| {
        vec![
            ScopePlan {
                scope: SourceScope::AuthorPosts(author.to_string()),
                lower_bound: posts,
            },
            ScopePlan {
                scope: SourceScope::AuthorReplies(author.to_string()),
                lower_bound: replies,
            },
        ]
    };

    let (strategy, scopes) = match mode {
        CacheMode::CacheOnly => (FetchStrategy::CacheOnly, Vec::new()),
        CacheMode::NoCache | CacheMode::FullSave => (FetchStrategy::Full, scopes(None, None)),
        CacheMode::Default => {
            let posts = cursor.and_then(|c| c.watermark(ItemKind::Post));
            let replies = cursor.and_then(|c| c.watermark(ItemKind::Reply));
            let strategy = if posts.is_some() || replies.is_some() {
                FetchStrategy::Incremental
            } else {
                FetchStrategy::Full
            };
            (strategy, scopes(posts, replies))
        }
    };

    FetchPlan {
        target,
        mode,
        strategy,
        scopes,
        persist: mode.persists(),
        completeness: Completeness::Untouched,
    }
}

/// Plan for a thread-scoped fetch given the stored thread cursor.
///
/// In default mode only a cursor with `history_complete` set allows an
/// incremental fetch. Replies cached by author fetches never shorten a
/// thread fetch.
pub fn plan_thread_fetch(thread_id: &str, mode: CacheMode, cursor: Option<&ThreadCursor>) -> FetchPlan {
    let target = FetchTarget::thread(thread_id);
    let listing = |lower_bound: Option<Timestamp>| {
        vec![ScopePlan {
            scope: SourceScope::ThreadReplies(thread_id.to_string()),
            lower_bound,
        }]
    };

    let (strategy, scopes, completeness) = match mode {
        CacheMode::CacheOnly => (FetchStrategy::CacheOnly, Vec::new(), Completeness::Untouched),
        CacheMode::NoCache => (FetchStrategy::Full, listing(None), Completeness::Untouched),
        CacheMode::FullSave => (FetchStrategy::Full, listing(None), Completeness::MarkComplete),
        CacheMode::Default => match cursor {
            Some(cursor) if cursor.history_complete => (
                FetchStrategy::Incremental,
                listing(cursor.newest_reply),
                Completeness::RetainComplete,
            ),
            _ => (FetchStrategy::Full, listing(None), Completeness::MarkComplete),
        },
    };

    FetchPlan {
        target,
        mode,
        strategy,
        scopes,
        persist: mode.persists(),
        completeness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_without_cursor_is_full() {
        let plan = plan_thread_fetch("abc123", CacheMode::Default, None);
        assert!(plan.is_full());
        assert_eq!(plan.lower_bound(ItemKind::Reply), None);
        assert_eq!(plan.completeness, Completeness::MarkComplete);
        assert!(plan.persist);
    }

    #[test]
    fn test_incomplete_thread_cursor_is_full() {
        let cursor = ThreadCursor::new("abc123").after_incremental(Some(500));
        let plan = plan_thread_fetch("abc123", CacheMode::Default, Some(&cursor));

        assert!(plan.is_full());
        assert_eq!(plan.lower_bound(ItemKind::Reply), None);
    }

    #[test]
    fn test_complete_thread_cursor_is_incremental() {
        let cursor = ThreadCursor::new("abc123").after_full_fetch(Some(500));
        let plan = plan_thread_fetch("abc123", CacheMode::Default, Some(&cursor));

        assert!(plan.is_incremental());
        assert_eq!(plan.lower_bound(ItemKind::Reply), Some(500));
        assert_eq!(plan.completeness, Completeness::RetainComplete);
    }

    #[test]
    fn test_full_save_ignores_complete_cursor() {
        let cursor = ThreadCursor::new("abc123").after_full_fetch(Some(500));
        let plan = plan_thread_fetch("abc123", CacheMode::FullSave, Some(&cursor));

        assert!(plan.is_full());
        assert_eq!(plan.lower_bound(ItemKind::Reply), None);
        assert_eq!(plan.completeness, Completeness::MarkComplete);
    }

    #[test]
    fn test_non_persisting_thread_modes_leave_flag_alone() {
        let no_cache = plan_thread_fetch("t", CacheMode::NoCache, None);
        assert!(no_cache.calls_source());
        assert!(!no_cache.persist);
        assert_eq!(no_cache.completeness, Completeness::Untouched);

        let cache_only = plan_thread_fetch("t", CacheMode::CacheOnly, None);
        assert!(!cache_only.calls_source());
        assert_eq!(cache_only.strategy, FetchStrategy::CacheOnly);
        assert_eq!(cache_only.completeness, Completeness::Untouched);
    }

    #[test]
    fn test_author_default_uses_watermarks_per_kind() {
        let cursor = AuthorCursor::new("alice").advanced(ItemKind::Reply, Some(42));
        let plan = plan_author_fetch("alice", CacheMode::Default, Some(&cursor));

        assert!(plan.is_incremental());
        assert_eq!(plan.lower_bound(ItemKind::Post), None);
        assert_eq!(plan.lower_bound(ItemKind::Reply), Some(42));
        assert_eq!(plan.completeness, Completeness::Untouched);
    }

    #[test]
    fn test_author_full_save_and_no_cache_start_from_scratch() {
        let cursor = AuthorCursor::new("alice")
            .advanced(ItemKind::Post, Some(7))
            .advanced(ItemKind::Reply, Some(9));

        let full = plan_author_fetch("alice", CacheMode::FullSave, Some(&cursor));
        assert!(full.is_full());
        assert!(full.persist);
        assert_eq!(full.lower_bound(ItemKind::Post), None);

        let no_cache = plan_author_fetch("alice", CacheMode::NoCache, Some(&cursor));
        assert!(!no_cache.persist);
        assert_eq!(no_cache.lower_bound(ItemKind::Reply), None);
        assert_eq!(no_cache.scopes.len(), 2);
    }

    #[test]
    fn test_author_plans_never_claim_completeness() {
        for mode in [CacheMode::Default, CacheMode::NoCache, CacheMode::CacheOnly, CacheMode::FullSave] {
            assert_eq!(plan_author_fetch("alice", mode, None).completeness, Completeness::Untouched);
        }
    }
}
