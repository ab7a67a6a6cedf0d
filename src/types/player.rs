use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::good::{OutpostId, Price};
use crate::types::holding::Holding;

/// Point-in-time copy of a player account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub username: String,
    pub current_outpost: OutpostId,
    pub money: Price,
    pub inventory: HashMap<String, Holding>,
}

/// Partial update for `PlayerDirectory::update_player`. `None` fields are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerUpdate {
    pub current_outpost: Option<OutpostId>,
    pub money: Option<Price>,
}
