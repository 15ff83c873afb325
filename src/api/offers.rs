use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{parse_body, required, ttl_override, AppState, CreatedResponse};
use crate::entities::{NewOffer, Offer, OfferRepository};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOfferRequest {
    pub skill: Option<String>,
    pub message: Option<String>,
    pub availability_window: Option<String>,
    pub expires_in: Option<Value>,
}

impl CreateOfferRequest {
    pub fn into_new_offer(self, state: &AppState) -> Result<NewOffer, AppError> {
        let (Some(skill), Some(message), Some(window)) = (
            required(&self.skill),
            required(&self.message),
            required(&self.availability_window),
        ) else {
            return Err(AppError::Validation(
                "skill, message, and availabilityWindow are required".to_string(),
            ));
        };

        Ok(NewOffer {
            wallet: state.wallet().to_string(),
            space_id: state.config.space_id.clone(),
            skill: skill.to_string(),
            message: message.to_string(),
            availability_window: window.to_string(),
            expires_in: ttl_override(&self.expires_in).unwrap_or(state.config.listing_ttl_secs),
        })
    }
}

/// GET /api/offers
pub async fn list_offers(State(state): State<AppState>) -> Result<Json<Vec<Offer>>, AppError> {
    let offers = OfferRepository::list_for_wallet(state.store(), state.wallet(), state.limit()).await?;
    Ok(Json(offers))
}

/// POST /api/offers
pub async fn create_offer(
    State(state): State<AppState>,
    payload: Result<Json<CreateOfferRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let offer = parse_body(payload)?.into_new_offer(&state)?;
    let receipt = OfferRepository::create(state.store(), offer).await?;
    Ok(Json(receipt.into()))
}
