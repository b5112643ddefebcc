//! Consistency rules that span several stored records: the friend-request
//! lifecycle with symmetric friend lists, idempotent likes with append-only
//! comments, and direct messages with monotonic read state.
//!
//! The store only guarantees per-record atomic writes. Read-modify-write
//! updates of users and posts go through versioned saves and are retried on
//! conflict; the two user writes of an accept stay independent and a failure
//! between them is repaired by [`RelationshipManager::reconcile`].

mod conversation;
mod engagement;
mod relationship;

use std::sync::Arc;

use abi::config::Config;
use db::DocumentStore;

pub use conversation::ConversationManager;
pub use engagement::EngagementManager;
pub use relationship::RelationshipManager;

/// the three managers wired to one store handle
#[derive(Debug, Clone)]
pub struct SocialCore {
    pub relationships: RelationshipManager,
    pub engagement: EngagementManager,
    pub conversations: ConversationManager,
}

impl SocialCore {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            relationships: RelationshipManager::new(store.clone(), config.consistency.clone()),
            engagement: EngagementManager::new(store.clone(), config.consistency.max_retries),
            conversations: ConversationManager::new(store),
        }
    }
}
