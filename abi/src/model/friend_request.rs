use serde::{Deserialize, Serialize};

use crate::model::friend_request_status::FriendStatus;
use crate::model::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub status: FriendStatus,
    #[serde(default)]
    pub created_at: i64,
}

impl FriendRequest {
    pub fn pending(sender_id: impl Into<String>, receiver_id: impl Into<String>, now: i64) -> Self {
        Self {
            id: None,
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            status: FriendStatus::Pending,
            created_at: now,
        }
    }
}

impl Record for FriendRequest {
    const COLLECTION: &'static str = "friend_requests";
}
