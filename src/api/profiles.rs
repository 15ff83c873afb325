use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use crate::api::{parse_body, AppState, CreatedResponse};
use crate::entities::{Profile, ProfileInput, ProfileRepository};
use crate::error::AppError;
use crate::store::Entity;

/// Cap on raw entities returned by `/api/profile`.
const RAW_PROFILE_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<Entity>,
}

/// GET /api/profiles
pub async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, AppError> {
    let profiles =
        ProfileRepository::list_for_wallet(state.store(), state.wallet(), state.limit()).await?;
    Ok(Json(profiles))
}

/// POST /api/profiles
pub async fn create_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let input = parse_body(payload)?;
    let receipt = ProfileRepository::create(
        state.store(),
        state.wallet(),
        &state.config.space_id,
        state.config.profile_ttl_secs,
        &input,
    )
    .await?;

    Ok(Json(receipt.into()))
}

/// GET /api/profile
pub async fn list_profile_entities(
    State(state): State<AppState>,
) -> Result<Json<EntitiesResponse>, AppError> {
    let entities = ProfileRepository::list_raw(state.store(), RAW_PROFILE_LIMIT).await?;
    Ok(Json(EntitiesResponse { entities }))
}
