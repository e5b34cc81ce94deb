pub mod error;
pub mod traits;
pub mod config;
pub mod pullpush;
pub mod memory;

pub use error::{SourceError, Result};
pub use traits::{ItemSource, ItemStream, SourceItem, SourceScope};
pub use config::PullPushConfig;
pub use pullpush::PullPushClient;
pub use memory::{Failure, MemorySource};
