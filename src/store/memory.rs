use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::store::models::{Entity, EntityQuery, EntityReceipt, NewEntity, Payload};
use crate::store::{expiry, now, random_hash, EntityStore};

/// In-process entity store. Entities are kept in creation order.
#[derive(Clone, Default)]
pub struct MemoryEntityStore {
    entities: Arc<Mutex<Vec<Entity>>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed entity as-is, e.g. one produced by another client.
    pub async fn insert(&self, entity: Entity) {
        self.entities.lock().await.push(entity);
    }

    pub async fn len(&self) -> usize {
        self.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.lock().await.is_empty()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn create_entity(&self, entity: NewEntity) -> Result<EntityReceipt, AppError> {
        let created_at = now();
        let receipt = EntityReceipt {
            entity_key: random_hash(),
            tx_hash: random_hash(),
        };

        self.entities.lock().await.push(Entity {
            key: receipt.entity_key.clone(),
            owner: entity.owner,
            content_type: entity.content_type,
            payload: Some(Payload::Bytes(entity.payload)),
            attributes: entity.attributes,
            created_at,
            expires_at: expiry(created_at, entity.expires_in),
            tx_hash: receipt.tx_hash.clone(),
        });

        Ok(receipt)
    }

    async fn update_entity(&self, key: &str, entity: NewEntity) -> Result<EntityReceipt, AppError> {
        let now = now();
        let mut entities = self.entities.lock().await;
        let existing = entities
            .iter_mut()
            .find(|e| e.key == key && !e.is_expired(now))
            .ok_or_else(|| AppError::NotFound(format!("Entity {} not found", key)))?;

        let tx_hash = random_hash();
        existing.owner = entity.owner;
        existing.content_type = entity.content_type;
        existing.payload = Some(Payload::Bytes(entity.payload));
        existing.attributes = entity.attributes;
        existing.expires_at = expiry(now, entity.expires_in);
        existing.tx_hash = tx_hash.clone();

        Ok(EntityReceipt {
            entity_key: key.to_string(),
            tx_hash,
        })
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, AppError> {
        let now = now();
        let entities = self.entities.lock().await;

        let live = |e: &&Entity| !e.is_expired(now) && e.matches(&query.predicates);
        let matched: Vec<&Entity> = if query.newest_first {
            entities.iter().rev().filter(live).take(query.limit).collect()
        } else {
            entities.iter().filter(live).take(query.limit).collect()
        };

        Ok(matched
            .into_iter()
            .cloned()
            .map(|e| query.project(e))
            .collect())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let now = now();
        let mut entities = self.entities.lock().await;
        let before = entities.len();
        entities.retain(|e| !e.is_expired(now));
        Ok((before - entities.len()) as u64)
    }
}
