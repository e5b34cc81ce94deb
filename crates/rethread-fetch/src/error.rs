use rethread_persist::PersistError;
use rethread_source::SourceError;
use rethread_types::InvalidModeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The source failed terminally; no cursor was written
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// An item or cursor write failed; cursors covering unwritten items were not advanced
    #[error("Store write failed: {0}")]
    StoreWriteFailed(PersistError),

    #[error("Store read failed: {0}")]
    StoreReadFailed(PersistError),

    #[error("Invalid cache mode: {0}")]
    InvalidMode(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),
}

impl From<InvalidModeError> for FetchError {
    fn from(err: InvalidModeError) -> Self {
        FetchError::InvalidMode(err.0)
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
