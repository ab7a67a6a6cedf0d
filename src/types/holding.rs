use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::good::Qty;

/// A player's owned quantity of one good. `average_price` is the weighted mean
/// unit cost of purchases; sells leave it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub quantity: Qty,
    pub average_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub trade_ids: Vec<Uuid>,
}
