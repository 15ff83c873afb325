use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::api::asks::CreateAskRequest;
use crate::api::offers::CreateOfferRequest;
use crate::api::{parse_body, AppState};
use crate::entities::{
    Ask, AskRepository, Feedback, FeedbackRepository, Offer, OfferRepository, Profile,
    ProfileInput, ProfileRepository, Session, SessionRepository,
};
use crate::error::AppError;
use crate::meeting;
use crate::reputation::{self, Reputation};
use crate::store::EntityReceipt;

/// Profile merged with the reputation computed from sessions and feedback.
#[derive(Debug, Serialize)]
pub struct EnrichedProfile {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub reputation: Reputation,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub wallet: String,
    pub profile: Option<EnrichedProfile>,
    pub asks: Vec<Ask>,
    pub offers: Vec<Offer>,
    pub sessions: Vec<Session>,
    pub feedback: Vec<Feedback>,
}

/// GET /api/me
pub async fn get_me(State(state): State<AppState>) -> Result<Json<MeResponse>, AppError> {
    let store = state.store();
    let wallet = state.wallet();
    let limit = state.limit();

    let (profile, asks, offers, mut sessions, feedback) = tokio::try_join!(
        ProfileRepository::get_by_wallet(store, wallet),
        AskRepository::list_for_wallet(store, wallet, limit),
        OfferRepository::list_for_wallet(store, wallet, limit),
        SessionRepository::list_for_wallet(store, wallet, limit),
        FeedbackRepository::list_for_wallet(store, wallet, limit),
    )?;

    meeting::attach_meetings(&mut sessions, &state.config.jitsi_base_url);

    let profile = profile.map(|profile| EnrichedProfile {
        profile,
        reputation: reputation::compute(wallet, &sessions, &feedback, chrono::Utc::now()),
    });

    Ok(Json(MeResponse {
        wallet: wallet.to_string(),
        profile,
        asks,
        offers,
        sessions,
        feedback,
    }))
}

/// POST /api/me, dispatched on the body's `action` field.
pub async fn post_me(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(payload)?;
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let receipt = match action.as_str() {
        "createProfile" => {
            let input: ProfileInput = from_body(body)?;
            ProfileRepository::create(
                state.store(),
                state.wallet(),
                &state.config.space_id,
                state.config.profile_ttl_secs,
                &input,
            )
            .await?
        }
        "updateProfile" => {
            let input: ProfileInput = from_body(body)?;
            ProfileRepository::update(
                state.store(),
                state.wallet(),
                &state.config.space_id,
                state.config.profile_ttl_secs,
                &input,
            )
            .await?
        }
        "createAsk" => {
            let ask = from_body::<CreateAskRequest>(body)?.into_new_ask(&state)?;
            AskRepository::create(state.store(), ask).await?
        }
        "createOffer" => {
            let offer = from_body::<CreateOfferRequest>(body)?.into_new_offer(&state)?;
            OfferRepository::create(state.store(), offer).await?
        }
        _ => return Err(AppError::Validation("Invalid action".to_string())),
    };

    Ok(Json(ok(receipt)))
}

fn from_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

fn ok(receipt: EntityReceipt) -> Value {
    json!({
        "ok": true,
        "key": receipt.entity_key,
        "txHash": receipt.tx_hash,
    })
}
