use serde::Serialize;
use serde_json::json;

use crate::entities::decode::Fields;
use crate::entities::{timestamp, ListingFilter, DEFAULT_SPACE_ID};
use crate::error::AppError;
use crate::store::{Entity, EntityQuery, EntityReceipt, EntityStore, NewEntity};

pub const OFFER_TYPE: &str = "offer";
pub const OFFER_STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub key: String,
    pub wallet: String,
    pub skill: String,
    pub space_id: String,
    pub created_at: String,
    pub status: String,
    pub message: String,
    pub availability_window: String,
    pub expires_at: i64,
    pub tx_hash: String,
}

impl Offer {
    pub fn from_entity(entity: &Entity) -> Self {
        let fields = Fields::new(entity);
        Offer {
            key: entity.key.clone(),
            wallet: fields.text_or("wallet", ""),
            skill: fields.text_or("skill", ""),
            space_id: fields.text_or("spaceId", DEFAULT_SPACE_ID),
            created_at: fields.text_or("createdAt", ""),
            status: fields.text_or("status", OFFER_STATUS_ACTIVE),
            message: fields.text_or("message", ""),
            availability_window: fields.text_or("availabilityWindow", ""),
            expires_at: entity.expires_at,
            tx_hash: entity.tx_hash.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub wallet: String,
    pub space_id: String,
    pub skill: String,
    pub message: String,
    pub availability_window: String,
    pub expires_in: u64,
}

pub struct OfferRepository;

impl OfferRepository {
    pub async fn create(store: &dyn EntityStore, offer: NewOffer) -> Result<EntityReceipt, AppError> {
        let created_at = timestamp(chrono::Utc::now());
        let payload = json!({
            "message": offer.message,
            "availabilityWindow": offer.availability_window,
        });

        let entity = NewEntity::json(&offer.wallet, &payload, offer.expires_in)?
            .attribute("type", OFFER_TYPE)
            .attribute("wallet", offer.wallet.as_str())
            .attribute("skill", offer.skill.as_str())
            .attribute("spaceId", offer.space_id.as_str())
            .attribute("createdAt", created_at)
            .attribute("status", OFFER_STATUS_ACTIVE);

        let receipt = store.create_entity(entity).await?;
        tracing::info!(wallet = %offer.wallet, skill = %offer.skill, key = %receipt.entity_key, "offer created");
        Ok(receipt)
    }

    pub async fn list(
        store: &dyn EntityStore,
        filter: &ListingFilter,
        limit: usize,
    ) -> Result<Vec<Offer>, AppError> {
        let entities = store.query(&filter.apply(Self::base_query(limit))).await?;
        Ok(entities.iter().map(Offer::from_entity).collect())
    }

    pub async fn list_for_wallet(
        store: &dyn EntityStore,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<Offer>, AppError> {
        let entities = store
            .query(&Self::base_query(limit).where_eq("wallet", wallet))
            .await?;
        Ok(entities.iter().map(Offer::from_entity).collect())
    }

    fn base_query(limit: usize) -> EntityQuery {
        EntityQuery::new()
            .where_eq("type", OFFER_TYPE)
            .with_attributes(true)
            .with_payload(true)
            .limit(limit)
    }
}
