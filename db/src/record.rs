//! typed access on top of the raw document store

use abi::errors::Result;
use abi::model::Record;

use crate::store::{DocumentStore, Filter};

pub async fn find<T: Record>(store: &dyn DocumentStore, id: &str) -> Result<Option<T>> {
    match store.load(T::COLLECTION, id).await? {
        None => Ok(None),
        Some(doc) => Ok(Some(T::from_doc(doc)?)),
    }
}

/// save the record and return it as stored, with its id filled in
pub async fn insert<T: Record>(store: &dyn DocumentStore, record: &T) -> Result<T> {
    let doc = store.save(T::COLLECTION, record.to_doc()?).await?;
    T::from_doc(doc)
}

pub async fn query<T: Record>(store: &dyn DocumentStore, filter: Filter<'_>) -> Result<Vec<T>> {
    store
        .query_by_field(T::COLLECTION, filter)
        .await?
        .into_iter()
        .map(T::from_doc)
        .collect()
}
