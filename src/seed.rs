//! World state container and the JSON seed used to populate it.
//!
//! Seed format:
//! ```json
//! {
//!   "outposts": [
//!     { "id": "venice", "goods_available": [
//!         { "name": "Silk", "price": 12, "quantity": 100, "unit": "meter" } ] }
//!   ],
//!   "players": [ { "username": "marco", "current_outpost": "venice", "money": 1000 } ]
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ConfigError, TradeError};
use crate::inventory::Inventory;
use crate::ledger::TradeLedger;
use crate::players::PlayerDirectory;
use crate::settlement::engine::SettlementEngine;
use crate::stock::SharedStock;
use crate::types::good::{GoodInStock, Price, Qty};

/// Stock, players and ledger shared by the settlement engine.
#[derive(Clone, Default)]
pub struct World {
    pub stock: SharedStock,
    pub players: Arc<PlayerDirectory>,
    pub ledger: Arc<TradeLedger>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_engine(self, db: Option<PgPool>) -> SettlementEngine {
        SettlementEngine::new(self.stock, self.players, self.ledger, db)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedGood {
    pub name: String,
    pub price: Price,
    pub quantity: Qty,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedOutpost {
    pub id: String,
    #[serde(default)]
    pub goods_available: Vec<SeedGood>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPlayer {
    pub username: String,
    pub current_outpost: String,
    pub money: Price,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSeed {
    #[serde(default)]
    pub outposts: Vec<SeedOutpost>,
    #[serde(default)]
    pub players: Vec<SeedPlayer>,
}

impl WorldSeed {
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let seed: Self = serde_json::from_str(&contents)?;
        Ok(seed)
    }

    /// Populate `world`. Outposts are replaced wholesale; players are
    /// registered with empty inventories.
    pub async fn apply(&self, world: &World) -> Result<(), TradeError> {
        let now = Utc::now();
        for outpost in &self.outposts {
            let mut goods = Vec::with_capacity(outpost.goods_available.len());
            for good in &outpost.goods_available {
                if good.price <= 0 {
                    return Err(TradeError::InvalidArgument(format!(
                        "seed price for {} at {} must be positive",
                        good.name, outpost.id
                    )));
                }
                goods.push(GoodInStock {
                    name: good.name.clone(),
                    outpost_id: outpost.id.clone(),
                    price: good.price,
                    quantity: good.quantity,
                    unit: good.unit.clone(),
                    last_updated: now,
                    last_traded: None,
                });
            }
            world.stock.update_outpost_goods(&outpost.id, goods).await;
        }
        for player in &self.players {
            world
                .players
                .register_player(&player.username, &player.current_outpost, player.money, Inventory::new())
                .await?;
        }
        Ok(())
    }
}
