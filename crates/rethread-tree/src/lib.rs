pub mod error;
pub mod node;
pub mod builder;
pub mod document;

pub use error::{Inconsistency, Result, TreeError};
pub use node::{ReplyForest, ReplyNode, Walk};
pub use builder::build;
pub use document::{render_thread, ThreadMetadata};
