use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entities::decode::{split_list, Fields};
use crate::entities::{timestamp, DEFAULT_SPACE_ID};
use crate::error::AppError;
use crate::store::{Entity, EntityQuery, EntityReceipt, EntityStore, NewEntity};

pub const PROFILE_TYPE: &str = "user_profile";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub key: String,
    pub wallet: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_long: Option<String>,
    pub skills: String,
    pub skills_array: Vec<String>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_links: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains_of_interest: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learner_roles: Option<Vec<String>>,
    pub space_id: String,
    pub created_at: String,
    pub tx_hash: String,
}

impl Profile {
    pub fn from_entity(entity: &Entity) -> Self {
        let fields = Fields::new(entity);
        let skills = fields.text_or("skills", "");
        let skills_array = fields
            .list("skillsArray")
            .unwrap_or_else(|| split_list(&skills));

        Profile {
            key: entity.key.clone(),
            wallet: fields.text_or("wallet", ""),
            display_name: fields.text_or("displayName", ""),
            username: fields.text("username"),
            profile_image: fields.text("profileImage"),
            bio: fields.text("bio"),
            bio_short: fields.text("bioShort"),
            bio_long: fields.text("bioLong"),
            skills,
            skills_array,
            timezone: fields.text_or("timezone", ""),
            languages: fields.list("languages"),
            contact_links: fields.map("contactLinks"),
            seniority: fields.text("seniority"),
            domains_of_interest: fields.list("domainsOfInterest"),
            mentor_roles: fields.list("mentorRoles"),
            learner_roles: fields.list("learnerRoles"),
            space_id: fields.text_or("spaceId", DEFAULT_SPACE_ID),
            created_at: fields.text("createdAt").unwrap_or_else(|| {
                chrono::DateTime::from_timestamp(entity.created_at, 0)
                    .map(timestamp)
                    .unwrap_or_default()
            }),
            tx_hash: entity.tx_hash.clone(),
        }
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        let skill = skill.trim();
        self.skills_array
            .iter()
            .chain(split_list(&self.skills).iter())
            .any(|s| s.eq_ignore_ascii_case(skill))
    }
}

/// Profile fields accepted from clients on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInput {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub bio_short: Option<String>,
    pub bio_long: Option<String>,
    pub skills: Option<String>,
    pub skills_array: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub languages: Option<Vec<String>>,
    pub contact_links: Option<BTreeMap<String, String>>,
    pub seniority: Option<String>,
    pub domains_of_interest: Option<Vec<String>>,
    pub mentor_roles: Option<Vec<String>>,
    pub learner_roles: Option<Vec<String>>,
}

impl ProfileInput {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(AppError::Validation("displayName is required".to_string())),
        }
    }

    fn skills_array(&self) -> Option<Vec<String>> {
        self.skills_array.clone().or_else(|| {
            self.skills
                .as_deref()
                .map(split_list)
                .filter(|list| !list.is_empty())
        })
    }

    fn to_entity(
        &self,
        wallet: &str,
        space_id: &str,
        created_at: &str,
        ttl: u64,
    ) -> Result<NewEntity, AppError> {
        let display_name = self.display_name.as_deref().unwrap_or_default().trim();
        let skills = self.skills.as_deref().unwrap_or_default();
        let timezone = self.timezone.as_deref().unwrap_or_default();

        let payload = json!({
            "wallet": wallet,
            "displayName": display_name,
            "username": self.username,
            "profileImage": self.profile_image,
            "bio": self.bio,
            "bioShort": self.bio_short,
            "bioLong": self.bio_long,
            "skills": skills,
            "skillsArray": self.skills_array(),
            "timezone": timezone,
            "languages": self.languages,
            "contactLinks": self.contact_links,
            "seniority": self.seniority,
            "domainsOfInterest": self.domains_of_interest,
            "mentorRoles": self.mentor_roles,
            "learnerRoles": self.learner_roles,
            "spaceId": space_id,
            "createdAt": created_at,
        });

        let mut entity = NewEntity::json(wallet, &payload, ttl)?
            .attribute("type", PROFILE_TYPE)
            .attribute("wallet", wallet)
            .attribute("displayName", display_name)
            .attribute("skills", skills)
            .attribute("timezone", timezone)
            .attribute("spaceId", space_id)
            .attribute("createdAt", created_at);
        if let Some(seniority) = self.seniority.as_deref().filter(|s| !s.trim().is_empty()) {
            entity = entity.attribute("seniority", seniority.trim());
        }

        Ok(entity)
    }
}

/// Network-browser filter for profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub skill: Option<String>,
    pub seniority: Option<String>,
    pub space_id: Option<String>,
}

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn create(
        store: &dyn EntityStore,
        wallet: &str,
        space_id: &str,
        ttl: u64,
        input: &ProfileInput,
    ) -> Result<EntityReceipt, AppError> {
        input.validate()?;

        let created_at = timestamp(chrono::Utc::now());
        let entity = input.to_entity(wallet, space_id, &created_at, ttl)?;
        let receipt = store.create_entity(entity).await?;

        tracing::info!(wallet, key = %receipt.entity_key, "profile created");
        Ok(receipt)
    }

    /// Rewrites the wallet's current profile in place.
    pub async fn update(
        store: &dyn EntityStore,
        wallet: &str,
        space_id: &str,
        ttl: u64,
        input: &ProfileInput,
    ) -> Result<EntityReceipt, AppError> {
        input.validate()?;

        let existing = Self::get_by_wallet(store, wallet)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let entity = input.to_entity(wallet, space_id, &existing.created_at, ttl)?;
        let receipt = store.update_entity(&existing.key, entity).await?;

        tracing::info!(wallet, key = %receipt.entity_key, "profile updated");
        Ok(receipt)
    }

    pub async fn list(
        store: &dyn EntityStore,
        filter: &ProfileFilter,
        limit: usize,
    ) -> Result<Vec<Profile>, AppError> {
        let mut query = Self::base_query(limit);
        if let Some(seniority) = &filter.seniority {
            query = query.where_eq("seniority", seniority.clone());
        }
        if let Some(space_id) = &filter.space_id {
            query = query.where_eq("spaceId", space_id.clone());
        }

        // Skills are stored as a comma list, so membership is checked after the fetch.
        let profiles = store
            .query(&query)
            .await?
            .iter()
            .map(Profile::from_entity)
            .filter(|p| filter.skill.as_deref().map_or(true, |skill| p.has_skill(skill)))
            .collect();

        Ok(profiles)
    }

    pub async fn list_for_wallet(
        store: &dyn EntityStore,
        wallet: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, AppError> {
        let entities = store
            .query(&Self::base_query(limit).where_eq("wallet", wallet))
            .await?;

        Ok(entities.iter().map(Profile::from_entity).collect())
    }

    /// Most recently created profile of `wallet`, if any.
    pub async fn get_by_wallet(
        store: &dyn EntityStore,
        wallet: &str,
    ) -> Result<Option<Profile>, AppError> {
        let query = Self::base_query(1).where_eq("wallet", wallet).newest_first();
        let entities = store.query(&query).await?;

        Ok(entities.first().map(Profile::from_entity))
    }

    /// Undecoded profile entities, as the store returns them.
    pub async fn list_raw(store: &dyn EntityStore, limit: usize) -> Result<Vec<Entity>, AppError> {
        store.query(&Self::base_query(limit)).await
    }

    fn base_query(limit: usize) -> EntityQuery {
        EntityQuery::new()
            .where_eq("type", PROFILE_TYPE)
            .with_attributes(true)
            .with_payload(true)
            .limit(limit)
    }
}
