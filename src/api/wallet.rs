use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub address: String,
}

/// GET /api/wallet
pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletResponse> {
    Json(WalletResponse {
        address: state.wallet().to_string(),
    })
}
