use serde::Serialize;

use crate::entities::decode::Fields;
use crate::entities::{merge_by_key, ListingFilter, DEFAULT_SPACE_ID};
use crate::error::AppError;
use crate::store::{Entity, EntityQuery, EntityStore};

pub const SESSION_TYPE: &str = "session";
pub const SESSION_STATUS_COMPLETED: &str = "completed";
pub const SESSION_STATUS_SCHEDULED: &str = "scheduled";

/// A mentoring session between a mentor and a learner. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub key: String,
    pub mentor_wallet: String,
    pub learner_wallet: String,
    pub skill: String,
    pub space_id: String,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
    /// Minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_join_url: Option<String>,
    pub tx_hash: String,
}

impl Session {
    pub fn from_entity(entity: &Entity) -> Self {
        let fields = Fields::new(entity);
        Session {
            key: entity.key.clone(),
            mentor_wallet: fields.text_or("mentorWallet", ""),
            learner_wallet: fields.text_or("learnerWallet", ""),
            skill: fields.text_or("skill", ""),
            space_id: fields.text_or("spaceId", DEFAULT_SPACE_ID),
            status: fields.text_or("status", "pending"),
            created_at: fields.text_or("createdAt", ""),
            session_date: fields.text("sessionDate"),
            duration: fields.number("duration"),
            notes: fields.text("notes"),
            video_provider: fields.text("videoProvider"),
            video_room_name: fields.text("videoRoomName"),
            video_join_url: fields.text("videoJoinUrl"),
            tx_hash: entity.tx_hash.clone(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SESSION_STATUS_COMPLETED
    }
}

pub struct SessionRepository;

impl SessionRepository {
    pub async fn list(
        store: &dyn EntityStore,
        filter: &ListingFilter,
        limit: usize,
    ) -> Result<Vec<Session>, AppError> {
        let entities = store.query(&filter.apply(Self::base_query(limit))).await?;
        Ok(entities.iter().map(Session::from_entity).collect())
    }

    /// Sessions where `wallet` is the mentor or the learner.
    pub async fn list_for_wallet(
        store: &dyn EntityStore,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<Session>, AppError> {
        let as_mentor = Self::base_query(limit).where_eq("mentorWallet", wallet);
        let as_learner = Self::base_query(limit).where_eq("learnerWallet", wallet);

        let (mentoring, learning) = tokio::try_join!(store.query(&as_mentor), store.query(&as_learner))?;

        let sessions = merge_by_key(mentoring, learning, |e| e.key.as_str());
        Ok(sessions.iter().map(Session::from_entity).collect())
    }

    fn base_query(limit: usize) -> EntityQuery {
        EntityQuery::new()
            .where_eq("type", SESSION_TYPE)
            .with_attributes(true)
            .with_payload(true)
            .limit(limit)
    }
}
