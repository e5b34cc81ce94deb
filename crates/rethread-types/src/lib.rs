pub mod item;
pub mod cursor;
pub mod mode;
pub mod target;

pub use item::{Post, Reply, ItemBatch, ItemKind, Timestamp};
pub use cursor::{AuthorCursor, ThreadCursor};
pub use mode::{CacheMode, InvalidModeError};
pub use target::FetchTarget;
