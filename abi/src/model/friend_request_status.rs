use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// lifecycle of a friend request: created pending, ends rejected or accepted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl FriendStatus {
    /// the value stored in the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Pending => "PENDING",
            FriendStatus::Accepted => "ACCEPTED",
            FriendStatus::Rejected => "REJECTED",
        }
    }
}

impl Display for FriendStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_value_matches_serde_name() {
        for status in [
            FriendStatus::Pending,
            FriendStatus::Accepted,
            FriendStatus::Rejected,
        ] {
            let bson = bson::to_bson(&status).unwrap();
            assert_eq!(bson.as_str(), Some(status.as_str()));
        }
    }
}
