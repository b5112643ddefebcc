pub mod friend_request;
pub mod friend_request_status;
pub mod msg;
pub mod post;
pub mod user;

use bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::Result;

pub use friend_request::FriendRequest;
pub use friend_request_status::FriendStatus;
pub use msg::Message;
pub use post::{Comment, Post};
pub use user::User;

/// primary key field of every stored document
pub const ID_FIELD: &str = "_id";

/// optimistic concurrency counter on documents written through versioned saves
pub const VERSION_FIELD: &str = "version";

/// a typed entity living in its own collection of the document store
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn to_doc(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    fn from_doc(doc: Document) -> Result<Self> {
        Ok(bson::from_document(doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_id_field() {
        let doc = Post::new("u1", "hello").to_doc().unwrap();
        assert!(!doc.contains_key(ID_FIELD));
        assert_eq!(doc.get_i64(VERSION_FIELD).unwrap(), 0);
    }

    #[test]
    fn user_friends_survive_document_conversion() {
        let mut user = User::new("a@b.c", "hash").with_id("u1");
        user.friends.insert("u2".to_string());
        let doc = user.to_doc().unwrap();
        assert_eq!(doc.get_str(ID_FIELD).unwrap(), "u1");
        assert_eq!(User::from_doc(doc).unwrap(), user);
    }

    #[test]
    fn friend_request_status_is_stored_uppercase() {
        let req = FriendRequest::pending("u1", "u2", 10);
        let doc = req.to_doc().unwrap();
        assert_eq!(doc.get_str("status").unwrap(), "PENDING");
    }
}
