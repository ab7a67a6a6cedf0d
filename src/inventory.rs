//! Inventory Ledger: per-player holdings, quantity plus weighted average cost.
//! Mutated only by the settlement engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::TradeError;
use crate::types::good::{Price, Qty};
use crate::types::holding::Holding;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    holdings: HashMap<String, Holding>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_holdings(holdings: HashMap<String, Holding>) -> Self {
        Self { holdings }
    }

    pub fn get_holding(&self, good: &str) -> Option<&Holding> {
        self.holdings.get(good)
    }

    pub fn holdings(&self) -> &HashMap<String, Holding> {
        &self.holdings
    }

    /// Apply one trade leg to the holding for `good`.
    ///
    /// Positive `quantity_delta` (purchase) folds `cost_delta` into the weighted
    /// average: `(old_q * old_avg + cost_delta) / new_q`. Negative delta (sell)
    /// reduces quantity and leaves the average as it was. A holding that
    /// reaches zero is kept along with its trade history.
    pub fn apply_delta(
        &mut self,
        good: &str,
        quantity_delta: i64,
        cost_delta: Price,
        trade_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&Holding, TradeError> {
        let held = self.holdings.get(good).map_or(0, |h| h.quantity);
        let change = quantity_delta.unsigned_abs();

        let new_qty: Qty = if quantity_delta >= 0 {
            held.checked_add(change)
                .ok_or_else(|| TradeError::InvalidArgument("holding quantity overflow".to_string()))?
        } else {
            held.checked_sub(change).ok_or_else(|| TradeError::InsufficientHolding {
                good: good.to_string(),
                requested: change,
                held,
            })?
        };

        let holding = self.holdings.entry(good.to_string()).or_insert_with(|| Holding {
            quantity: 0,
            average_price: 0.0,
            created_at: now,
            updated_at: now,
            trade_ids: Vec::new(),
        });

        if quantity_delta > 0 {
            holding.average_price = if held == 0 {
                cost_delta as f64 / change as f64
            } else {
                (held as f64 * holding.average_price + cost_delta as f64) / new_qty as f64
            };
        }
        holding.quantity = new_qty;
        holding.updated_at = now;
        holding.trade_ids.push(trade_id);
        Ok(holding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_purchase_sets_unit_cost() {
        let mut inv = Inventory::new();
        let h = inv.apply_delta("Silk", 4, 100, Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(h.quantity, 4);
        assert_eq!(h.average_price, 25.0);
        assert_eq!(h.trade_ids.len(), 1);
    }

    #[test]
    fn weighted_average_on_top_up() {
        let mut inv = Inventory::new();
        inv.apply_delta("Silk", 10, 50, Uuid::new_v4(), Utc::now()).unwrap();
        let h = inv.apply_delta("Silk", 5, 50, Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(h.quantity, 15);
        assert!((h.average_price - 100.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn sell_keeps_average_and_zero_holding() {
        let mut inv = Inventory::new();
        inv.apply_delta("Wine", 3, 30, Uuid::new_v4(), Utc::now()).unwrap();
        let h = inv.apply_delta("Wine", -3, 0, Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(h.quantity, 0);
        assert_eq!(h.average_price, 10.0);
        assert_eq!(h.trade_ids.len(), 2);
        assert!(inv.get_holding("Wine").is_some());
    }

    #[test]
    fn oversell_is_rejected_without_change() {
        let mut inv = Inventory::new();
        inv.apply_delta("Wine", 2, 20, Uuid::new_v4(), Utc::now()).unwrap();
        let before = inv.clone();
        let err = inv.apply_delta("Wine", -5, 0, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientHolding { good: "Wine".to_string(), requested: 5, held: 2 }
        );
        assert_eq!(inv, before);
    }
}
