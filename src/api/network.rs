use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{parse_query, AppState};
use crate::entities::{
    Ask, AskRepository, ListingFilter, Offer, OfferRepository, Profile, ProfileFilter,
    ProfileRepository, Session, SessionRepository,
};
use crate::error::AppError;
use crate::meeting;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQuery {
    pub skill: Option<String>,
    pub space_id: Option<String>,
    pub seniority: Option<String>,
}

impl NetworkQuery {
    fn listing_filter(&self) -> ListingFilter {
        ListingFilter {
            skill: present(&self.skill),
            space_id: present(&self.space_id),
        }
    }

    fn profile_filter(&self) -> ProfileFilter {
        ProfileFilter {
            skill: present(&self.skill),
            seniority: present(&self.seniority),
            space_id: present(&self.space_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub asks: Vec<Ask>,
    pub offers: Vec<Offer>,
    pub profiles: Vec<Profile>,
    pub sessions: Vec<Session>,
}

/// GET /api/network
pub async fn browse(
    State(state): State<AppState>,
    query: Result<Query<NetworkQuery>, QueryRejection>,
) -> Result<Json<NetworkResponse>, AppError> {
    let query = parse_query(query)?;
    let store = state.store();
    let limit = state.limit();
    let listing = query.listing_filter();
    let profile = query.profile_filter();

    tracing::debug!(?listing, ?profile, "browsing network");

    let (asks, offers, profiles, mut sessions) = tokio::try_join!(
        AskRepository::list(store, &listing, limit),
        OfferRepository::list(store, &listing, limit),
        ProfileRepository::list(store, &profile, limit),
        SessionRepository::list(store, &listing, limit),
    )?;

    meeting::attach_meetings(&mut sessions, &state.config.jitsi_base_url);

    Ok(Json(NetworkResponse {
        asks,
        offers,
        profiles,
        sessions,
    }))
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
