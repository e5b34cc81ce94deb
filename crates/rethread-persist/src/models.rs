use rethread_types::{Post, Reply};
use serde::{Deserialize, Serialize};

/// Everything cached under one thread id.
///
/// `post` can be absent while replies exist: an author-scoped fetch caches
/// replies without their thread's post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadItems {
    pub post: Option<Post>,
    pub replies: Vec<Reply>,
}

/// Everything cached for one author, across threads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorItems {
    pub posts: Vec<Post>,
    pub replies: Vec<Reply>,
}

impl AuthorItems {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.replies.is_empty()
    }
}
