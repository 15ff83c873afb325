pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryEntityStore;
pub use models::{Attribute, Entity, EntityQuery, EntityReceipt, NewEntity, Payload};
pub use sqlite::SqliteEntityStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;

/// Attributed key/payload ledger backing all persistence.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_entity(&self, entity: NewEntity) -> Result<EntityReceipt, AppError>;

    /// Replaces payload, attributes and expiry of a live entity.
    async fn update_entity(&self, key: &str, entity: NewEntity) -> Result<EntityReceipt, AppError>;

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, AppError>;

    /// Drops expired entities, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}

pub async fn connect(config: &Config) -> Result<Arc<dyn EntityStore>, AppError> {
    match &config.store {
        StoreBackend::Memory => Ok(Arc::new(MemoryEntityStore::new())),
        StoreBackend::Sqlite(url) => {
            let store = SqliteEntityStore::connect(url, config.db_max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Random 32-byte `0x`-prefixed hex string, used for entity keys and tx hashes.
pub(crate) fn random_hash() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn expiry(created_at: i64, expires_in: u64) -> i64 {
    created_at.saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX))
}
