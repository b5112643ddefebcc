use tracing::{debug, warn};

use abi::errors::{Error, ErrorKind, Result};
use abi::model::Record;

use crate::record::find;
use crate::store::DocumentStore;

/// load, mutate and write back through a versioned save.
///
/// A write that loses against a concurrent writer is retried from a fresh
/// load, at most `max_retries` times, after which the `Conflict` is returned.
/// `mutate` returns whether it changed anything; an unchanged record is
/// returned without writing.
pub async fn update_with_retry<T, F>(
    store: &dyn DocumentStore,
    id: &str,
    max_retries: u32,
    mut mutate: F,
) -> Result<T>
where
    T: Record,
    F: FnMut(&mut T) -> Result<bool> + Send,
{
    let mut attempt = 0;
    loop {
        let mut record: T = find(store, id)
            .await?
            .ok_or_else(|| Error::not_found_with_details(format!("{} {}", T::COLLECTION, id)))?;

        if !mutate(&mut record)? {
            debug!("{} {} unchanged, skip write", T::COLLECTION, id);
            return Ok(record);
        }

        match store.save_versioned(T::COLLECTION, record.to_doc()?).await {
            Ok(doc) => return T::from_doc(doc),
            Err(e) if e.kind() == ErrorKind::Conflict && attempt < max_retries => {
                attempt += 1;
                warn!(
                    "concurrent write on {} {}, retry {}/{}",
                    T::COLLECTION,
                    id,
                    attempt,
                    max_retries
                );
            }
            Err(e) => return Err(e),
        }
    }
}
