use serde::Serialize;
use serde_json::json;

use crate::entities::decode::Fields;
use crate::entities::{timestamp, ListingFilter, DEFAULT_SPACE_ID};
use crate::error::AppError;
use crate::store::{Entity, EntityQuery, EntityReceipt, EntityStore, NewEntity};

pub const ASK_TYPE: &str = "ask";
pub const ASK_STATUS_OPEN: &str = "open";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ask {
    pub key: String,
    pub wallet: String,
    pub skill: String,
    pub space_id: String,
    pub created_at: String,
    pub status: String,
    pub message: String,
    pub expires_at: i64,
    pub tx_hash: String,
}

impl Ask {
    pub fn from_entity(entity: &Entity) -> Self {
        let fields = Fields::new(entity);
        Ask {
            key: entity.key.clone(),
            wallet: fields.text_or("wallet", ""),
            skill: fields.text_or("skill", ""),
            space_id: fields.text_or("spaceId", DEFAULT_SPACE_ID),
            created_at: fields.text_or("createdAt", ""),
            status: fields.text_or("status", ASK_STATUS_OPEN),
            message: fields.text_or("message", ""),
            expires_at: entity.expires_at,
            tx_hash: entity.tx_hash.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAsk {
    pub wallet: String,
    pub space_id: String,
    pub skill: String,
    pub message: String,
    pub expires_in: u64,
}

pub struct AskRepository;

impl AskRepository {
    pub async fn create(store: &dyn EntityStore, ask: NewAsk) -> Result<EntityReceipt, AppError> {
        let created_at = timestamp(chrono::Utc::now());

        let entity = NewEntity::json(&ask.wallet, &json!({ "message": ask.message }), ask.expires_in)?
            .attribute("type", ASK_TYPE)
            .attribute("wallet", ask.wallet.as_str())
            .attribute("skill", ask.skill.as_str())
            .attribute("spaceId", ask.space_id.as_str())
            .attribute("createdAt", created_at)
            .attribute("status", ASK_STATUS_OPEN);

        let receipt = store.create_entity(entity).await?;
        tracing::info!(wallet = %ask.wallet, skill = %ask.skill, key = %receipt.entity_key, "ask created");
        Ok(receipt)
    }

    pub async fn list(
        store: &dyn EntityStore,
        filter: &ListingFilter,
        limit: usize,
    ) -> Result<Vec<Ask>, AppError> {
        let entities = store.query(&filter.apply(Self::base_query(limit))).await?;
        Ok(entities.iter().map(Ask::from_entity).collect())
    }

    pub async fn list_for_wallet(
        store: &dyn EntityStore,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<Ask>, AppError> {
        let entities = store
            .query(&Self::base_query(limit).where_eq("wallet", wallet))
            .await?;
        Ok(entities.iter().map(Ask::from_entity).collect())
    }

    fn base_query(limit: usize) -> EntityQuery {
        EntityQuery::new()
            .where_eq("type", ASK_TYPE)
            .with_attributes(true)
            .with_payload(true)
            .limit(limit)
    }
}
