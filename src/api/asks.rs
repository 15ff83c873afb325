use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{parse_body, required, ttl_override, AppState, CreatedResponse};
use crate::entities::{Ask, AskRepository, NewAsk};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAskRequest {
    pub skill: Option<String>,
    pub message: Option<String>,
    pub expires_in: Option<Value>,
}

impl CreateAskRequest {
    pub fn into_new_ask(self, state: &AppState) -> Result<NewAsk, AppError> {
        let (Some(skill), Some(message)) = (required(&self.skill), required(&self.message)) else {
            return Err(AppError::Validation("skill and message are required".to_string()));
        };

        Ok(NewAsk {
            wallet: state.wallet().to_string(),
            space_id: state.config.space_id.clone(),
            skill: skill.to_string(),
            message: message.to_string(),
            expires_in: ttl_override(&self.expires_in).unwrap_or(state.config.listing_ttl_secs),
        })
    }
}

/// GET /api/asks
pub async fn list_asks(State(state): State<AppState>) -> Result<Json<Vec<Ask>>, AppError> {
    let asks = AskRepository::list_for_wallet(state.store(), state.wallet(), state.limit()).await?;
    Ok(Json(asks))
}

/// POST /api/asks
pub async fn create_ask(
    State(state): State<AppState>,
    payload: Result<Json<CreateAskRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let ask = parse_body(payload)?.into_new_ask(&state)?;
    let receipt = AskRepository::create(state.store(), ask).await?;
    Ok(Json(receipt.into()))
}
