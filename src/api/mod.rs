pub mod asks;
pub mod me;
pub mod network;
pub mod offers;
pub mod profiles;
pub mod state;
pub mod wallet;

pub use state::AppState;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// `{key, txHash}` returned by the plain create endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub key: String,
    pub tx_hash: String,
}

impl From<crate::store::EntityReceipt> for CreatedResponse {
    fn from(receipt: crate::store::EntityReceipt) -> Self {
        Self {
            key: receipt.entity_key,
            tx_hash: receipt.tx_hash,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/api/health", get(health).fallback(method_not_allowed))
        .route("/api/wallet", get(wallet::get_wallet).fallback(method_not_allowed))

        // Listings owned by the configured wallet
        .route(
            "/api/asks",
            get(asks::list_asks).post(asks::create_ask).fallback(method_not_allowed),
        )
        .route(
            "/api/offers",
            get(offers::list_offers).post(offers::create_offer).fallback(method_not_allowed),
        )

        // Profiles
        .route(
            "/api/profiles",
            get(profiles::list_profiles)
                .post(profiles::create_profile)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/profile",
            get(profiles::list_profile_entities).fallback(method_not_allowed),
        )

        // Dashboard and discovery
        .route(
            "/api/me",
            get(me::get_me).post(me::post_me).fallback(method_not_allowed),
        )
        .route("/api/network", get(network::browse).fallback(method_not_allowed))

        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Unwraps a JSON body, turning any extractor rejection into a 400.
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwraps a query string, turning any extractor rejection into a 400.
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Trimmed value of a required text field; `None` when absent or blank.
pub(crate) fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// TTL override in seconds, from a number or a numeric string. Anything else is ignored.
pub(crate) fn ttl_override(raw: &Option<Value>) -> Option<u64> {
    let secs = match raw.as_ref()? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    secs.filter(|secs| *secs > 0)
}
