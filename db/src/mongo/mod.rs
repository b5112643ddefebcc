#[cfg(test)]
mod tester;

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::ReplaceOptions;
use mongodb::{Client, Collection, Database};
use tracing::debug;

use abi::config::Config;
use abi::errors::{Error, Result};
use abi::model::{ID_FIELD, VERSION_FIELD};

use crate::store::{ensure_id, DocumentStore, Filter};

/// mongodb error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

/// every entity type lives in its own collection of one database
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Client::with_uri_str(config.store.mongodb.url())
            .await?
            .database(&config.store.mongodb.database);
        Ok(Self::new(db))
    }

    fn coll(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        MongoErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .coll(collection)
            .find_one(doc! {ID_FIELD: id}, None)
            .await?)
    }

    async fn save(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let id = ensure_id(&mut doc)?;
        debug!("save {} into {}", id, collection);
        let option = ReplaceOptions::builder().upsert(true).build();
        self.coll(collection)
            .replace_one(doc! {ID_FIELD: id.as_str()}, &doc, option)
            .await?;
        Ok(doc)
    }

    async fn save_versioned(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let id = ensure_id(&mut doc)?;
        let expected = doc.get_i64(VERSION_FIELD).unwrap_or_default();
        doc.insert(VERSION_FIELD, expected + 1);

        // records written by plain saves carry no version and count as version 0
        let filter = if expected == 0 {
            doc! {
                ID_FIELD: id.as_str(),
                "$or": [{VERSION_FIELD: 0_i64}, {VERSION_FIELD: {"$exists": false}}],
            }
        } else {
            doc! {ID_FIELD: id.as_str(), VERSION_FIELD: expected}
        };

        let coll = self.coll(collection);
        let result = coll.replace_one(filter, &doc, None).await?;
        if result.matched_count == 1 {
            return Ok(doc);
        }

        let exists = coll.find_one(doc! {ID_FIELD: id.as_str()}, None).await?.is_some();
        match (exists, expected) {
            (false, 0) => match coll.insert_one(&doc, None).await {
                Ok(_) => Ok(doc),
                // another writer created it between our check and insert
                Err(e) if is_duplicate_key(&e) => Err(Error::conflict(format!(
                    "{} {}: created concurrently",
                    collection, id
                ))),
                Err(e) => Err(e.into()),
            },
            (false, _) => Err(Error::not_found_with_details(format!(
                "{} {}",
                collection, id
            ))),
            (true, _) => Err(Error::conflict(format!(
                "{} {}: expected version {}",
                collection, id, expected
            ))),
        }
    }

    async fn query_by_field(&self, collection: &str, filter: Filter<'_>) -> Result<Vec<Document>> {
        let mut query = Document::new();
        for (field, value) in filter {
            query.insert(*field, value.clone());
        }

        let mut cursor = self.coll(collection).find(query, None).await?;
        let mut docs = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }
}
