use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use rethread_types::{AuthorCursor, ItemBatch, Post, ThreadCursor};

use crate::dbs::mongo::models::{MongoAuthorCursor, MongoPost, MongoReply, MongoThreadCursor};
use crate::error::{PersistError, Result};
use crate::models::{AuthorItems, ThreadItems};
use crate::store::ItemStore;

pub struct MongoItemStore {
    posts: Collection<MongoPost>,
    replies: Collection<MongoReply>,
    author_cursors: Collection<MongoAuthorCursor>,
    thread_cursors: Collection<MongoThreadCursor>,
}

impl MongoItemStore {
    /// Connect to MongoDB and bind the four collections
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!("Connected to MongoDB database {}", database);
        Ok(Self::new(&client, database))
    }

    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            posts: db.collection("posts"),
            replies: db.collection("replies"),
            author_cursors: db.collection("author_cursors"),
            thread_cursors: db.collection("thread_cursors"),
        }
    }
}

#[async_trait]
impl ItemStore for MongoItemStore {
    async fn get_author_cursor(&self, author: &str) -> Result<Option<AuthorCursor>> {
        let cursor = self.author_cursors.find_one(doc! { "_id": author }).await?;
        Ok(cursor.map(Into::into))
    }

    async fn put_author_cursor(&self, cursor: AuthorCursor) -> Result<()> {
        let document: MongoAuthorCursor = cursor.into();
        self.author_cursors
            .replace_one(doc! { "_id": document.author.as_str() }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get_thread_cursor(&self, thread_id: &str) -> Result<Option<ThreadCursor>> {
        let cursor = self.thread_cursors.find_one(doc! { "_id": thread_id }).await?;
        Ok(cursor.map(Into::into))
    }

    async fn put_thread_cursor(&self, cursor: ThreadCursor) -> Result<()> {
        let document: MongoThreadCursor = cursor.into();
        self.thread_cursors
            .replace_one(doc! { "_id": document.thread_id.as_str() }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn upsert_items(&self, batch: ItemBatch) -> Result<()> {
        tracing::debug!("Upserting {} {:?} items", batch.len(), batch.kind());
        match batch {
            ItemBatch::Posts(posts) => {
                for post in posts {
                    let document: MongoPost = post.into();
                    self.posts
                        .replace_one(doc! { "_id": document.id.as_str() }, &document)
                        .upsert(true)
                        .await?;
                }
            }
            ItemBatch::Replies(replies) => {
                for reply in replies {
                    let document: MongoReply = reply.into();
                    self.replies
                        .replace_one(doc! { "_id": document.id.as_str() }, &document)
                        .upsert(true)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let post = self.posts.find_one(doc! { "_id": post_id }).await?;
        Ok(post.map(Into::into))
    }

    async fn get_thread_items(&self, thread_id: &str) -> Result<ThreadItems> {
        let post = self.get_post(thread_id).await?;
        let replies: Vec<MongoReply> = self
            .replies
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "created_utc": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(ThreadItems {
            post,
            replies: replies.into_iter().map(Into::into).collect(),
        })
    }

    async fn get_author_items(&self, author: &str) -> Result<AuthorItems> {
        let posts: Vec<MongoPost> = self
            .posts
            .find(doc! { "author": author })
            .sort(doc! { "created_utc": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        let replies: Vec<MongoReply> = self
            .replies
            .find(doc! { "author": author })
            .sort(doc! { "created_utc": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(AuthorItems {
            posts: posts.into_iter().map(Into::into).collect(),
            replies: replies.into_iter().map(Into::into).collect(),
        })
    }
}
