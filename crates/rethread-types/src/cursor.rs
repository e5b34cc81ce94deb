use serde::{Deserialize, Serialize};

use crate::item::{ItemKind, Timestamp};

/// Per-author watermarks across all threads.
///
/// Says nothing about whether any single thread is completely cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCursor {
    pub author: String,
    pub newest_post: Option<Timestamp>,
    pub newest_reply: Option<Timestamp>,
}

impl AuthorCursor {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            newest_post: None,
            newest_reply: None,
        }
    }

    pub fn watermark(&self, kind: ItemKind) -> Option<Timestamp> {
        match kind {
            ItemKind::Post => self.newest_post,
            ItemKind::Reply => self.newest_reply,
        }
    }

    /// Merge an observed maximum into the watermark for `kind`. Never moves backwards.
    pub fn advanced(mut self, kind: ItemKind, observed: Option<Timestamp>) -> Self {
        let slot = match kind {
            ItemKind::Post => &mut self.newest_post,
            ItemKind::Reply => &mut self.newest_reply,
        };
        *slot = max_watermark(*slot, observed);
        self
    }
}

/// Per-thread watermark plus the history-complete flag.
///
/// `history_complete` is only ever set by a successful full thread fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCursor {
    pub thread_id: String,
    pub newest_reply: Option<Timestamp>,
    #[serde(default)]
    pub history_complete: bool,
}

impl ThreadCursor {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            newest_reply: None,
            history_complete: false,
        }
    }

    /// State after a full fetch retrieved every reply of the thread
    pub fn after_full_fetch(mut self, observed: Option<Timestamp>) -> Self {
        self.newest_reply = max_watermark(self.newest_reply, observed);
        self.history_complete = true;
        self
    }

    /// State after an incremental fetch appended newer replies. The flag is
    /// carried over unchanged.
    pub fn after_incremental(mut self, observed: Option<Timestamp>) -> Self {
        self.newest_reply = max_watermark(self.newest_reply, observed);
        self
    }

    /// Forced override: completeness can no longer be guaranteed
    pub fn invalidated(mut self) -> Self {
        self.history_complete = false;
        self
    }
}

fn max_watermark(stored: Option<Timestamp>, observed: Option<Timestamp>) -> Option<Timestamp> {
    match (stored, observed) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
