pub mod error;
pub mod config;
pub mod plan;
pub mod cursor;
pub mod lock;
pub mod coordinator;

pub use error::{FetchError, Result};
pub use config::CoordinatorConfig;
pub use plan::{plan_author_fetch, plan_thread_fetch, Completeness, FetchPlan, FetchStrategy, ScopePlan};
pub use cursor::{AuthorCursorTracker, ThreadCursorTracker};
pub use lock::KeyLocks;
pub use coordinator::{AuthorFetch, FetchCoordinator, FetchOutcome, ThreadFetch};
