//! Trade Settlement Engine: validates and executes purchases and sells.
//!
//! Preconditions are checked before anything is written. Writes happen in this
//! order: stock reservation (atomic, guarded), database transaction if one is
//! configured, then the player's money and inventory, then the ledger. A
//! failure after the reservation hands the stock back.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::TradeError;
use crate::ledger::TradeLedger;
use crate::persistence::{persist_purchase, persist_sell};
use crate::players::PlayerDirectory;
use crate::stock::SharedStock;
use crate::types::good::{Price, Qty};
use crate::types::trade::{Receipt, TradeRecord, TradeType};

#[derive(Clone)]
pub struct SettlementEngine {
    stock: SharedStock,
    players: Arc<PlayerDirectory>,
    ledger: Arc<TradeLedger>,
    db: Option<PgPool>,
}

fn positive_quantity(quantity: i64) -> Result<Qty, TradeError> {
    if quantity <= 0 {
        return Err(TradeError::InvalidArgument(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(quantity as Qty)
}

fn total_price(quantity: Qty, unit_price: Price) -> Result<Price, TradeError> {
    (quantity as i64)
        .checked_mul(unit_price)
        .ok_or_else(|| TradeError::InvalidArgument("trade value overflow".to_string()))
}

impl SettlementEngine {
    pub fn new(
        stock: SharedStock,
        players: Arc<PlayerDirectory>,
        ledger: Arc<TradeLedger>,
        db: Option<PgPool>,
    ) -> Self {
        Self { stock, players, ledger, db }
    }

    pub fn stock(&self) -> &SharedStock {
        &self.stock
    }

    pub fn players(&self) -> &Arc<PlayerDirectory> {
        &self.players
    }

    pub fn ledger(&self) -> &Arc<TradeLedger> {
        &self.ledger
    }

    pub async fn purchase(
        &self,
        username: &str,
        good_name: &str,
        quantity: i64,
        outpost_id: &str,
    ) -> Result<Receipt, TradeError> {
        self.settle_purchase(username, good_name, quantity, outpost_id)
            .await
            .inspect_err(|err| {
                tracing::debug!(username, good_name, quantity, outpost_id, error = %err, "purchase rejected");
            })
    }

    async fn settle_purchase(
        &self,
        username: &str,
        good_name: &str,
        quantity: i64,
        outpost_id: &str,
    ) -> Result<Receipt, TradeError> {
        let quantity = positive_quantity(quantity)?;

        if !self.stock.outpost_exists(outpost_id).await {
            return Err(TradeError::OutpostNotFound(outpost_id.to_string()));
        }
        let listing = self
            .stock
            .find_stock(good_name, outpost_id)
            .await
            .ok_or_else(|| TradeError::GoodNotFound {
                good: good_name.to_string(),
                outpost_id: outpost_id.to_string(),
            })?;
        if quantity > listing.quantity {
            return Err(TradeError::InsufficientStock {
                requested: quantity,
                available: listing.quantity,
            });
        }

        let player = self
            .players
            .find_player(username)
            .await
            .ok_or_else(|| TradeError::PlayerNotFound(username.to_string()))?;
        let mut account = player.lock().await;
        if account.current_outpost != outpost_id {
            return Err(TradeError::WrongLocation {
                current: account.current_outpost.clone(),
                requested: outpost_id.to_string(),
            });
        }
        let money_spent = total_price(quantity, listing.price)?;
        if account.money < money_spent {
            return Err(TradeError::InsufficientFunds {
                required: money_spent,
                available: account.money,
            });
        }

        let trade_id = Uuid::new_v4();
        let now = Utc::now();
        let mut inventory = account.inventory.clone();
        let holding = inventory
            .apply_delta(good_name, quantity as i64, money_spent, trade_id, now)?
            .clone();
        let record = TradeRecord {
            id: trade_id,
            username: account.username.clone(),
            good_name: good_name.to_string(),
            quantity,
            outpost_id: outpost_id.to_string(),
            trade_type: TradeType::Purchase,
            unit_price: listing.price,
            total_price: money_spent,
            created_at: now,
        };

        // Stock may have been taken by another buyer since the check above.
        self.stock.take(good_name, outpost_id, quantity).await?;
        if let Some(pool) = &self.db {
            if let Err(err) = persist_purchase(pool, &record, &holding).await {
                self.stock.give_back(good_name, outpost_id, quantity).await;
                return Err(err);
            }
        }

        account.money -= money_spent;
        account.inventory = inventory;
        self.stock.mark_traded(good_name, outpost_id, Utc::now()).await;
        self.ledger.append(record).await;

        tracing::info!(
            trade_id = %trade_id,
            username = %account.username,
            good_name,
            outpost_id,
            quantity,
            unit_price = listing.price,
            total_price = money_spent,
            "purchase settled"
        );

        Ok(Receipt {
            message: format!(
                "Purchased {quantity} {} of {good_name} for {money_spent}",
                listing.unit
            ),
            trade_id,
            quantity,
            unit_price: listing.price,
            total_price: money_spent,
            money: account.money,
            holding_quantity: holding.quantity,
        })
    }

    /// Sell `quantity` units of a held good at the player's outpost. The seller's
    /// `price` and `unit` become the outpost's listing for that good. The
    /// holding's average price is not recomputed.
    pub async fn sell(
        &self,
        username: &str,
        good_name: &str,
        quantity: i64,
        outpost_id: &str,
        price: Price,
        unit: &str,
    ) -> Result<Receipt, TradeError> {
        self.settle_sell(username, good_name, quantity, outpost_id, price, unit)
            .await
            .inspect_err(|err| {
                tracing::debug!(username, good_name, quantity, outpost_id, error = %err, "sell rejected");
            })
    }

    async fn settle_sell(
        &self,
        username: &str,
        good_name: &str,
        quantity: i64,
        outpost_id: &str,
        price: Price,
        unit: &str,
    ) -> Result<Receipt, TradeError> {
        let quantity = positive_quantity(quantity)?;
        if price <= 0 {
            return Err(TradeError::InvalidArgument(format!("price must be positive, got {price}")));
        }
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(TradeError::InvalidArgument("unit is required".to_string()));
        }

        let not_here = || TradeError::PlayerNotAtOutpost {
            username: username.to_string(),
            outpost_id: outpost_id.to_string(),
        };
        let player = self.players.find_player(username).await.ok_or_else(not_here)?;
        let mut account = player.lock().await;
        if account.current_outpost != outpost_id {
            return Err(not_here());
        }
        if !self.stock.outpost_exists(outpost_id).await {
            return Err(TradeError::OutpostNotFound(outpost_id.to_string()));
        }

        let trade_id = Uuid::new_v4();
        let now = Utc::now();
        let mut inventory = account.inventory.clone();
        let holding = inventory
            .apply_delta(good_name, -(quantity as i64), 0, trade_id, now)?
            .clone();
        let proceeds = total_price(quantity, price)?;
        let record = TradeRecord {
            id: trade_id,
            username: account.username.clone(),
            good_name: good_name.to_string(),
            quantity,
            outpost_id: outpost_id.to_string(),
            trade_type: TradeType::Sell,
            unit_price: price,
            total_price: proceeds,
            created_at: now,
        };

        if let Some(pool) = &self.db {
            persist_sell(pool, &record, &holding, unit).await?;
        }
        self.stock
            .put(good_name, outpost_id, quantity, price, unit, now)
            .await?;
        account.inventory = inventory;
        self.ledger.append(record).await;

        tracing::info!(
            trade_id = %trade_id,
            username = %account.username,
            good_name,
            outpost_id,
            quantity,
            unit_price = price,
            "sell settled"
        );

        Ok(Receipt {
            message: format!("Sold {quantity} {unit} of {good_name} at {price} each"),
            trade_id,
            quantity,
            unit_price: price,
            total_price: proceeds,
            money: account.money,
            holding_quantity: holding.quantity,
        })
    }
}
