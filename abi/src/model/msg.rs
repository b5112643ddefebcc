use serde::{Deserialize, Serialize};

use crate::model::Record;

/// direct message; `is_read` only moves from false to true
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    /// server time in milliseconds, client values are overwritten
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

impl Record for Message {
    const COLLECTION: &'static str = "messages";
}
