//! Player Directory: username -> account (location, money, inventory).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::TradeError;
use crate::inventory::Inventory;
use crate::types::good::{OutpostId, Price};
use crate::types::player::{PlayerSnapshot, PlayerUpdate};

#[derive(Debug, Clone)]
pub struct PlayerAccount {
    pub username: String,
    pub current_outpost: OutpostId,
    pub money: Price,
    pub inventory: Inventory,
}

impl PlayerAccount {
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            username: self.username.clone(),
            current_outpost: self.current_outpost.clone(),
            money: self.money,
            inventory: self.inventory.holdings().clone(),
        }
    }
}

/// Holding the lock serializes every settlement that touches this player.
pub type SharedPlayer = Arc<Mutex<PlayerAccount>>;

#[derive(Default)]
pub struct PlayerDirectory {
    players: RwLock<HashMap<String, SharedPlayer>>,
}

/// Usernames are matched trimmed and case-insensitively.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player, or replace the account stored under the same username.
    pub async fn register_player(
        &self,
        username: &str,
        current_outpost: &str,
        money: Price,
        inventory: Inventory,
    ) -> Result<(), TradeError> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(TradeError::InvalidArgument("username is required".to_string()));
        }
        if money < 0 {
            return Err(TradeError::InvalidArgument("money must not be negative".to_string()));
        }
        let account = PlayerAccount {
            username: username.clone(),
            current_outpost: current_outpost.to_string(),
            money,
            inventory,
        };
        self.players
            .write()
            .await
            .insert(username, Arc::new(Mutex::new(account)));
        Ok(())
    }

    pub async fn find_player(&self, username: &str) -> Option<SharedPlayer> {
        self.players.read().await.get(&normalize_username(username)).cloned()
    }

    pub async fn update_player(&self, username: &str, update: PlayerUpdate) -> Result<PlayerSnapshot, TradeError> {
        let player = self
            .find_player(username)
            .await
            .ok_or_else(|| TradeError::PlayerNotFound(username.to_string()))?;
        let mut account = player.lock().await;
        if let Some(money) = update.money {
            if money < 0 {
                return Err(TradeError::InvalidArgument("money must not be negative".to_string()));
            }
            account.money = money;
        }
        if let Some(outpost) = update.current_outpost {
            account.current_outpost = outpost;
        }
        Ok(account.snapshot())
    }

    pub async fn snapshot(&self, username: &str) -> Option<PlayerSnapshot> {
        let player = self.find_player(username).await?;
        let account = player.lock().await;
        Some(account.snapshot())
    }

    pub async fn snapshots(&self) -> Vec<PlayerSnapshot> {
        let players: Vec<SharedPlayer> = self.players.read().await.values().cloned().collect();
        let mut snapshots = Vec::with_capacity(players.len());
        for player in players {
            snapshots.push(player.lock().await.snapshot());
        }
        snapshots
    }
}
