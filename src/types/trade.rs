use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::good::{OutpostId, Price, Qty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Purchase,
    Sell,
}

impl TradeType {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Purchase => "purchase",
            TradeType::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(TradeType::Purchase),
            "sell" => Some(TradeType::Sell),
            _ => None,
        }
    }
}

/// Immutable trade ledger entry. Both the unit price and the total money moved
/// are recorded for either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub username: String,
    pub good_name: String,
    pub quantity: Qty,
    pub outpost_id: OutpostId,
    pub trade_type: TradeType,
    pub unit_price: Price,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

/// Returned to the caller of a successful settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub message: String,
    pub trade_id: Uuid,
    pub quantity: Qty,
    pub unit_price: Price,
    pub total_price: Price,
    pub money: Price,
    pub holding_quantity: Qty,
}
