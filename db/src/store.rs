use std::fmt::Debug;

use async_trait::async_trait;
use bson::document::ValueAccessError;
use bson::{Bson, Document};

use abi::errors::Result;
use abi::model::ID_FIELD;
use abi::utils;

/// exact-match conditions, all of which must hold
pub type Filter<'a> = &'a [(&'a str, Bson)];

/// per-record atomic persistence, no multi-record transactions
#[async_trait]
pub trait DocumentStore: Sync + Send + Debug {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// upsert by `_id`, an id is generated when the document has none
    async fn save(&self, collection: &str, doc: Document) -> Result<Document>;

    /// compare-and-swap on the `version` field.
    /// succeeds only when the stored version equals the document's (or the
    /// record is absent and the version is 0); the stored record gets version + 1
    async fn save_versioned(&self, collection: &str, doc: Document) -> Result<Document>;

    /// array fields match when they contain the value; an empty filter lists the collection
    async fn query_by_field(&self, collection: &str, filter: Filter<'_>) -> Result<Vec<Document>>;
}

/// read the string id of the document or give it a fresh one
pub(crate) fn ensure_id(doc: &mut Document) -> Result<String> {
    match doc.get_str(ID_FIELD) {
        Ok(id) => Ok(id.to_string()),
        Err(ValueAccessError::NotPresent) => {
            let id = utils::gen_id();
            doc.insert(ID_FIELD, id.clone());
            Ok(id)
        }
        // only string ids are supported
        Err(e) => Err(e.into()),
    }
}
