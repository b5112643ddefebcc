use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Record;

/// `friends` must stay symmetric: b in friends(a) implies a in friends(b)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub friends: BTreeSet<String>,
    #[serde(default)]
    pub version: i64,
}

impl User {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn is_friend(&self, user_id: &str) -> bool {
        self.friends.contains(user_id)
    }
}

impl Record for User {
    const COLLECTION: &'static str = "users";
}
