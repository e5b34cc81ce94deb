use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// Terminal failure: the source could not serve the request within its retry budget
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;
