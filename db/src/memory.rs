use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::{Bson, Document};
use dashmap::DashMap;
use tracing::debug;

use abi::errors::{Error, Result};
use abi::model::VERSION_FIELD;

use crate::store::{ensure_id, DocumentStore, Filter};

/// in-process document store, one ordered map per collection.
/// every write holds the collection's shard lock, so a single save is atomic
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of records in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or_default()
    }
}

fn matches(doc: &Document, filter: Filter<'_>) -> bool {
    filter.iter().all(|(field, value)| match doc.get(*field) {
        Some(Bson::Array(items)) => match value {
            Bson::Array(wanted) => wanted == items,
            single => items.contains(single),
        },
        Some(stored) => stored == value,
        None => false,
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id).cloned()))
    }

    async fn save(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let id = ensure_id(&mut doc)?;
        debug!("save {} into {}", id, collection);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(doc)
    }

    async fn save_versioned(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let id = ensure_id(&mut doc)?;
        let expected = doc.get_i64(VERSION_FIELD).unwrap_or_default();

        let mut coll = self.collections.entry(collection.to_string()).or_default();
        let current = coll
            .get(&id)
            .map(|stored| stored.get_i64(VERSION_FIELD).unwrap_or_default());
        match current {
            Some(version) if version != expected => {
                return Err(Error::conflict(format!(
                    "{} {}: expected version {}, found {}",
                    collection, id, expected, version
                )));
            }
            None if expected != 0 => {
                return Err(Error::not_found_with_details(format!(
                    "{} {}",
                    collection, id
                )));
            }
            _ => {}
        }

        doc.insert(VERSION_FIELD, expected + 1);
        coll.insert(id, doc.clone());
        Ok(doc)
    }

    async fn query_by_field(&self, collection: &str, filter: Filter<'_>) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
