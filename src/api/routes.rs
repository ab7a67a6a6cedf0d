use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::Deserialize;

use crate::error::TradeError;
use crate::settlement::engine::SettlementEngine;
use crate::types::good::Price;
use crate::types::trade::Receipt;

#[derive(Clone)]
pub struct AppState {
    pub engine: SettlementEngine,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub username: String,
    #[serde(alias = "good_name")]
    pub good_id: String,
    pub quantity: i64,
    pub outpost_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub username: String,
    #[serde(alias = "good_name")]
    pub good_id: String,
    pub quantity: i64,
    pub outpost_id: String,
    pub price: Price,
    pub unit: String,
}

/// Malformed or mistyped bodies answer 400 with the usual `{"error": ..}` shape.
fn bad_body(rejection: JsonRejection) -> TradeError {
    TradeError::InvalidArgument(rejection.body_text())
}

async fn health() -> &'static str {
    "healthy"
}

async fn purchase_goods(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<Receipt>, TradeError> {
    let Json(req) = payload.map_err(bad_body)?;
    let receipt = state
        .engine
        .purchase(&req.username, &req.good_id, req.quantity, &req.outpost_id)
        .await?;
    Ok(Json(receipt))
}

async fn sell_goods(
    State(state): State<AppState>,
    payload: Result<Json<SellRequest>, JsonRejection>,
) -> Result<Json<Receipt>, TradeError> {
    let Json(req) = payload.map_err(bad_body)?;
    let receipt = state
        .engine
        .sell(
            &req.username,
            &req.good_id,
            req.quantity,
            &req.outpost_id,
            req.price,
            &req.unit,
        )
        .await?;
    Ok(Json(receipt))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/goods/purchase", post(purchase_goods))
        .route("/goods/sell", post(sell_goods))
        .with_state(state)
}
