use std::thread;

use mongodb::{Client, Database};
use tokio::runtime::Runtime;

use abi::config::MongoDbConfig;

/// the configured server with a uuid-named database, dropped afterwards
pub struct MongoDbTester {
    config: MongoDbConfig,
}

impl MongoDbTester {
    pub fn new(config: &MongoDbConfig) -> Self {
        let mut config = config.clone();
        config.database = format!("test_{}", uuid::Uuid::new_v4().simple());
        Self { config }
    }

    pub async fn database(&self) -> Database {
        Client::with_uri_str(self.config.server_url())
            .await
            .unwrap()
            .database(&self.config.database)
    }
}

impl Drop for MongoDbTester {
    fn drop(&mut self) {
        let server_url = self.config.server_url();
        let dbname = self.config.database.clone();
        // the test runtime may be shutting down, drop on a fresh one
        thread::spawn(move || {
            Runtime::new().unwrap().block_on(async move {
                let client = Client::with_uri_str(server_url).await.unwrap();
                if let Err(e) = client.database(&dbname).drop(None).await {
                    println!("drop database error: {}", e);
                }
            });
        })
        .join()
        .unwrap();
    }
}
