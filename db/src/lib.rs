mod memory;
mod mongo;
mod record;
mod retry;
mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::sync::Arc;

use abi::config::{Config, StoreKind};
use abi::errors::Result;
use tracing::info;

pub use crate::memory::MemoryStore;
pub use crate::mongo::MongoStore;
pub use crate::record::{find, insert, query};
pub use crate::retry::update_with_retry;
pub use crate::store::{DocumentStore, Filter};

/// build the store the config asks for
pub async fn store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store.kind {
        StoreKind::Memory => {
            info!("using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Mongodb => {
            info!(
                "connect to mongodb: {}:{}/{}",
                config.store.mongodb.host, config.store.mongodb.port, config.store.mongodb.database
            );
            Ok(Arc::new(MongoStore::from_config(config).await?))
        }
    }
}
