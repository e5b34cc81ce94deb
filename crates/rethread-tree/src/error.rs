use thiserror::Error;

/// Why a thread's replies cannot form a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("reply cycle {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("reply {0} is its own parent")]
    SelfParent(String),

    #[error("reply {0} appears more than once")]
    DuplicateReply(String),

    #[error("reply {reply_id} belongs to thread {thread_id}")]
    ForeignReply { reply_id: String, thread_id: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Structural inconsistency in thread {thread_id}: {reason}")]
    StructuralInconsistency { thread_id: String, reason: Inconsistency },
}

impl TreeError {
    pub fn thread_id(&self) -> &str {
        match self {
            TreeError::StructuralInconsistency { thread_id, .. } => thread_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
