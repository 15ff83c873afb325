pub(crate) mod decode;

pub mod asks;
pub mod feedback;
pub mod offers;
pub mod profiles;
pub mod sessions;

pub use asks::{Ask, AskRepository, NewAsk};
pub use feedback::{Feedback, FeedbackRepository};
pub use offers::{NewOffer, Offer, OfferRepository};
pub use profiles::{Profile, ProfileFilter, ProfileInput, ProfileRepository};
pub use sessions::{Session, SessionRepository};

use chrono::{DateTime, SecondsFormat, Utc};

/// Space assumed for entities written without a `spaceId` attribute.
pub const DEFAULT_SPACE_ID: &str = "local-dev";

/// Narrows asks, offers and sessions through store predicates.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub skill: Option<String>,
    pub space_id: Option<String>,
}

impl ListingFilter {
    pub(crate) fn apply(&self, mut query: crate::store::EntityQuery) -> crate::store::EntityQuery {
        if let Some(skill) = &self.skill {
            query = query.where_eq("skill", skill.clone());
        }
        if let Some(space_id) = &self.space_id {
            query = query.where_eq("spaceId", space_id.clone());
        }
        query
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Merges two result sets, keeping the first occurrence of each key.
pub(crate) fn merge_by_key<T>(first: Vec<T>, second: Vec<T>, key: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::with_capacity(first.len() + second.len());
    for item in first.into_iter().chain(second) {
        if seen.insert(key(&item).to_string()) {
            merged.push(item);
        }
    }
    merged
}
