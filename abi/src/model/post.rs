use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Record;

/// a post with its engagement; `likes` holds each user once,
/// `comments` only ever grows at the end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub likes: BTreeSet<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub author_id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Post {
    pub fn new(author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Comment {
    pub fn new(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Record for Post {
    const COLLECTION: &'static str = "posts";
}
