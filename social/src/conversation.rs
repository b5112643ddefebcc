use std::sync::Arc;

use tracing::debug;

use abi::errors::{Error, Result};
use abi::model::{Message, Record};
use abi::utils;
use db::{find, insert, query, DocumentStore};

/// direct messages and their read state
#[derive(Debug, Clone)]
pub struct ConversationManager {
    store: Arc<dyn DocumentStore>,
}

impl ConversationManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// persist a new message. The server owns id, timestamp and read state:
    /// client values for them are discarded, so a resend can never overwrite
    /// a stored message or reset its read flag.
    pub async fn send_message(&self, mut message: Message) -> Result<Message> {
        message.id = None;
        message.timestamp = utils::now_millis();
        message.is_read = false;

        let message = insert(self.store.as_ref(), &message).await?;
        debug!(
            "message {:?} from {} to {}",
            message.id, message.sender_id, message.receiver_id
        );
        Ok(message)
    }

    /// idempotent, a read message stays read
    pub async fn mark_as_read(&self, message_id: &str) -> Result<()> {
        let mut message: Message = find(self.store.as_ref(), message_id)
            .await?
            .ok_or_else(|| {
                Error::not_found_with_details(format!("{} {}", Message::COLLECTION, message_id))
            })?;
        if message.is_read {
            return Ok(());
        }
        message.is_read = true;
        insert(self.store.as_ref(), &message).await?;
        Ok(())
    }

    /// messages sent by `sender_id` to `receiver_id` only, replies are not included
    pub async fn messages_between(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Vec<Message>> {
        query(
            self.store.as_ref(),
            &[
                ("sender_id", sender_id.into()),
                ("receiver_id", receiver_id.into()),
            ],
        )
        .await
    }

    /// the whole thread between two users, both directions, oldest first
    pub async fn conversation(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let mut thread = self.messages_between(a, b).await?;
        if a != b {
            thread.extend(self.messages_between(b, a).await?);
        }
        thread.sort_by(|x, y| x.timestamp.cmp(&y.timestamp).then_with(|| x.id.cmp(&y.id)));
        Ok(thread)
    }

    pub async fn unread_for(&self, receiver_id: &str) -> Result<Vec<Message>> {
        query(
            self.store.as_ref(),
            &[
                ("receiver_id", receiver_id.into()),
                ("is_read", false.into()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use abi::errors::ErrorKind;
    use db::MemoryStore;

    use super::*;

    fn manager() -> ConversationManager {
        ConversationManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn send_stamps_server_time_and_unread() {
        let manager = manager();
        let before = utils::now_millis();
        let mut message = Message::new("u1", "u2", "hey");
        message.timestamp = 42;
        message.is_read = true;

        let saved = manager.send_message(message).await.unwrap();
        assert!(saved.id.is_some());
        assert!(saved.timestamp >= before);
        assert!(!saved.is_read);
        assert_eq!(saved.content, "hey");
    }

    #[tokio::test]
    async fn client_id_cannot_overwrite_a_read_message() {
        let manager = manager();
        let first = manager
            .send_message(Message::new("u1", "u2", "hey"))
            .await
            .unwrap();
        let id = first.id.clone().unwrap();
        manager.mark_as_read(&id).await.unwrap();

        let mut replay = first;
        replay.content = "changed".to_string();
        let second = manager.send_message(replay).await.unwrap();
        assert_ne!(second.id.as_deref(), Some(id.as_str()));

        let unread = manager.unread_for("u2").await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].content, "changed");
    }

    #[tokio::test]
    async fn mark_as_read_is_idempotent() {
        let manager = manager();
        let id = manager
            .send_message(Message::new("u1", "u2", "hey"))
            .await
            .unwrap()
            .id
            .unwrap();
        assert_eq!(manager.unread_for("u2").await.unwrap().len(), 1);

        manager.mark_as_read(&id).await.unwrap();
        manager.mark_as_read(&id).await.unwrap();
        assert!(manager.unread_for("u2").await.unwrap().is_empty());

        let stored = manager.messages_between("u1", "u2").await.unwrap();
        assert!(stored[0].is_read);
    }

    #[tokio::test]
    async fn mark_unknown_message_is_not_found() {
        let err = manager().mark_as_read("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn messages_between_is_directional() {
        let manager = manager();
        manager
            .send_message(Message::new("u1", "u2", "ping"))
            .await
            .unwrap();

        assert_eq!(manager.messages_between("u1", "u2").await.unwrap().len(), 1);
        assert!(manager.messages_between("u2", "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conversation_merges_both_directions_in_time_order() {
        let manager = manager();
        for (from, to, text) in [("u1", "u2", "a"), ("u2", "u1", "b"), ("u1", "u2", "c")] {
            manager
                .send_message(Message::new(from, to, text))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        manager
            .send_message(Message::new("u1", "u3", "elsewhere"))
            .await
            .unwrap();

        let thread = manager.conversation("u2", "u1").await.unwrap();
        let texts: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert!(thread.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn unread_only_lists_receiver_messages() {
        let manager = manager();
        manager
            .send_message(Message::new("u1", "u2", "to u2"))
            .await
            .unwrap();
        manager
            .send_message(Message::new("u2", "u1", "to u1"))
            .await
            .unwrap();

        let unread = manager.unread_for("u2").await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].receiver_id, "u2");
        assert!(unread.iter().all(|m| !m.is_read));
    }
}
