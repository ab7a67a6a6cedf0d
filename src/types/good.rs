use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Price = i64;
pub type Qty = u64;
pub type OutpostId = String;

/// One entry of an outpost's goods-available view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodInStock {
    pub name: String,
    pub outpost_id: OutpostId,
    pub price: Price,
    pub quantity: Qty,
    pub unit: String,
    pub last_updated: DateTime<Utc>,
    /// Set by the most recent purchase of this good at this outpost.
    pub last_traded: Option<DateTime<Utc>>,
}
