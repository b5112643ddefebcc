//! store wrapper that makes partial failures and lost-update races reproducible

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use tokio::sync::Mutex;
use tracing::debug;

use abi::errors::{Error, Result};
use abi::model::ID_FIELD;

use crate::store::{DocumentStore, Filter};

type RaceWrite = Box<dyn FnOnce(&mut Document) + Send>;

struct Racer {
    collection: String,
    id: String,
    write: RaceWrite,
}

impl fmt::Debug for Racer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Racer({}/{})", self.collection, self.id)
    }
}

#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    /// saves still allowed before every save fails; negative means never fail
    saves_left: AtomicI64,
    racers: Mutex<Vec<Racer>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            saves_left: AtomicI64::new(-1),
            racers: Mutex::new(Vec::new()),
        }
    }

    /// let `n` more saves through, fail all later ones with `Unavailable`
    pub fn fail_after(&self, n: i64) {
        self.saves_left.store(n, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.saves_left.store(-1, Ordering::SeqCst);
    }

    /// right before the next versioned save of `collection/id`, another writer
    /// applies `write` to the stored record and saves it first
    pub async fn race_next_save(
        &self,
        collection: &str,
        id: &str,
        write: impl FnOnce(&mut Document) + Send + 'static,
    ) {
        self.racers.lock().await.push(Racer {
            collection: collection.to_string(),
            id: id.to_string(),
            write: Box::new(write),
        });
    }

    fn take_save_permit(&self) -> Result<()> {
        let taken = self
            .saves_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                (left > 0).then(|| left - 1)
            });
        match taken {
            Ok(_) => Ok(()),
            Err(left) if left < 0 => Ok(()),
            Err(_) => Err(Error::unavailable("injected store failure")),
        }
    }

    async fn run_racer(&self, collection: &str, id: &str) -> Result<()> {
        let racer = {
            let mut racers = self.racers.lock().await;
            racers
                .iter()
                .position(|r| r.collection == collection && r.id == id)
                .map(|i| racers.remove(i))
        };
        if let Some(racer) = racer {
            if let Some(mut current) = self.inner.load(collection, id).await? {
                debug!("racing write on {}/{}", collection, id);
                (racer.write)(&mut current);
                self.inner.save_versioned(collection, current).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.load(collection, id).await
    }

    async fn save(&self, collection: &str, doc: Document) -> Result<Document> {
        self.take_save_permit()?;
        self.inner.save(collection, doc).await
    }

    async fn save_versioned(&self, collection: &str, doc: Document) -> Result<Document> {
        self.take_save_permit()?;
        if let Ok(id) = doc.get_str(ID_FIELD) {
            let id = id.to_string();
            self.run_racer(collection, &id).await?;
        }
        self.inner.save_versioned(collection, doc).await
    }

    async fn query_by_field(&self, collection: &str, filter: Filter<'_>) -> Result<Vec<Document>> {
        self.inner.query_by_field(collection, filter).await
    }
}
