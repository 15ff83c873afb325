use serde::Serialize;

use crate::entities::decode::Fields;
use crate::entities::merge_by_key;
use crate::error::AppError;
use crate::store::{Entity, EntityQuery, EntityStore};

pub const FEEDBACK_TYPE: &str = "feedback";

/// Post-session feedback from one participant to the other. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub key: String,
    pub session_key: String,
    pub from_wallet: String,
    pub to_wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub created_at: String,
    pub tx_hash: String,
}

impl Feedback {
    pub fn from_entity(entity: &Entity) -> Self {
        let fields = Fields::new(entity);
        Feedback {
            key: entity.key.clone(),
            session_key: fields.text_or("sessionKey", ""),
            from_wallet: fields.text_or("fromWallet", ""),
            to_wallet: fields.text_or("toWallet", ""),
            rating: fields.number("rating"),
            nps_score: fields.number("npsScore"),
            text: fields.text("text"),
            created_at: fields.text_or("createdAt", ""),
            tx_hash: entity.tx_hash.clone(),
        }
    }
}

pub struct FeedbackRepository;

impl FeedbackRepository {
    /// Feedback given or received by `wallet`.
    pub async fn list_for_wallet(
        store: &dyn EntityStore,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<Feedback>, AppError> {
        let given = Self::base_query(limit).where_eq("fromWallet", wallet);
        let received = Self::base_query(limit).where_eq("toWallet", wallet);

        let (given, received) = tokio::try_join!(store.query(&given), store.query(&received))?;

        let feedback = merge_by_key(given, received, |e| e.key.as_str());
        Ok(feedback.iter().map(Feedback::from_entity).collect())
    }

    fn base_query(limit: usize) -> EntityQuery {
        EntityQuery::new()
            .where_eq("type", FEEDBACK_TYPE)
            .with_attributes(true)
            .with_payload(true)
            .limit(limit)
    }
}
