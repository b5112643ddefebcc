use std::sync::Arc;

use tracing::debug;

use abi::errors::Result;
use abi::model::{Comment, Post};
use abi::utils;
use db::{insert, query, update_with_retry, DocumentStore};

/// likes and comments on posts; never touches users or messages
#[derive(Debug, Clone)]
pub struct EngagementManager {
    store: Arc<dyn DocumentStore>,
    max_retries: u32,
}

impl EngagementManager {
    pub fn new(store: Arc<dyn DocumentStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    pub async fn create_post(&self, author_id: &str, content: &str) -> Result<Post> {
        let post = insert(self.store.as_ref(), &Post::new(author_id, content)).await?;
        debug!("post {:?} created by {}", post.id, author_id);
        Ok(post)
    }

    /// idempotent: a user appears in `likes` at most once
    pub async fn add_like(&self, post_id: &str, user_id: &str) -> Result<Post> {
        let user_id = user_id.to_string();
        update_with_retry(
            self.store.as_ref(),
            post_id,
            self.max_retries,
            |post: &mut Post| Ok(post.likes.insert(user_id.clone())),
        )
        .await
    }

    /// append the comment, stamped with the call time
    pub async fn add_comment(&self, post_id: &str, mut comment: Comment) -> Result<Post> {
        comment.created_at = utils::now_millis();
        if comment.id.is_none() {
            comment.id = Some(utils::gen_id());
        }

        let post = update_with_retry(
            self.store.as_ref(),
            post_id,
            self.max_retries,
            |post: &mut Post| {
                post.comments.push(comment.clone());
                Ok(true)
            },
        )
        .await?;
        debug!(
            "comment {:?} appended to post {}, {} in total",
            comment.id,
            post_id,
            post.comments.len()
        );
        Ok(post)
    }

    pub async fn posts_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        query(self.store.as_ref(), &[("author_id", author_id.into())]).await
    }

    pub async fn posts_liked_by(&self, user_id: &str) -> Result<Vec<Post>> {
        query(self.store.as_ref(), &[("likes", user_id.into())]).await
    }
}
