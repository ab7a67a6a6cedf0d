//! Stock Store: per-(outpost, good) availability.
//!
//! One authoritative record per good and outpost. The goods-available list of
//! an outpost is derived from those records on every read, ordered most
//! recently traded first, so there is no second copy to keep in sync.
//! Quantity changes are single compare-and-swap steps on the record.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;

use crate::error::TradeError;
use crate::types::good::{GoodInStock, OutpostId, Price, Qty};

pub type SharedStock = Arc<StockStore>;

struct Listing {
    price: Price,
    unit: String,
    last_updated: DateTime<Utc>,
    last_traded: Option<DateTime<Utc>>,
    // Store-wide trade counter at the last `mark_traded`; orders the view.
    trade_seq: Option<u64>,
}

struct StockEntry {
    name: String,
    outpost_id: OutpostId,
    // Catalog position for goods that were never traded.
    seq: u64,
    quantity: AtomicU64,
    listing: Mutex<Listing>,
}

impl StockEntry {
    fn listing(&self) -> MutexGuard<'_, Listing> {
        self.listing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn to_good(&self) -> GoodInStock {
        let listing = self.listing();
        GoodInStock {
            name: self.name.clone(),
            outpost_id: self.outpost_id.clone(),
            price: listing.price,
            quantity: self.quantity.load(Ordering::Acquire),
            unit: listing.unit.clone(),
            last_updated: listing.last_updated,
            last_traded: listing.last_traded,
        }
    }
}

#[derive(Default)]
pub struct StockStore {
    outposts: RwLock<HashMap<OutpostId, HashMap<String, Arc<StockEntry>>>>,
    next_seq: AtomicU64,
    next_trade_seq: AtomicU64,
}

impl StockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_entry(&self, good: &GoodInStock) -> Arc<StockEntry> {
        Arc::new(StockEntry {
            name: good.name.clone(),
            outpost_id: good.outpost_id.clone(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            quantity: AtomicU64::new(good.quantity),
            listing: Mutex::new(Listing {
                price: good.price,
                unit: good.unit.clone(),
                last_updated: good.last_updated,
                last_traded: good.last_traded,
                trade_seq: None,
            }),
        })
    }

    fn sorted_goods(catalog: &HashMap<String, Arc<StockEntry>>, by_trade: bool) -> Vec<GoodInStock> {
        let mut entries: Vec<(u64, Option<u64>, GoodInStock)> = catalog
            .values()
            .map(|e| {
                let trade_seq = e.listing().trade_seq;
                (e.seq, trade_seq, e.to_good())
            })
            .collect();
        entries.sort_by(|(seq_a, trade_a, _), (seq_b, trade_b, _)| {
            if by_trade {
                // Some(_) sorts above None, so reversing puts traded goods first.
                trade_b.cmp(trade_a).then(seq_a.cmp(seq_b))
            } else {
                seq_a.cmp(seq_b)
            }
        });
        entries.into_iter().map(|(_, _, g)| g).collect()
    }

    async fn entry(&self, good: &str, outpost_id: &str) -> Option<Arc<StockEntry>> {
        let guard = self.outposts.read().await;
        guard.get(outpost_id)?.get(good).cloned()
    }

    /// Register an outpost with an empty catalog. No-op if it already exists.
    pub async fn register_outpost(&self, outpost_id: &str) {
        let mut guard = self.outposts.write().await;
        guard.entry(outpost_id.to_string()).or_default();
    }

    pub async fn outpost_exists(&self, outpost_id: &str) -> bool {
        self.outposts.read().await.contains_key(outpost_id)
    }

    pub async fn outpost_ids(&self) -> Vec<OutpostId> {
        self.outposts.read().await.keys().cloned().collect()
    }

    /// Goods-available view of an outpost: most recently traded first, then
    /// never-traded goods in catalog order.
    pub async fn find_outpost(&self, outpost_id: &str) -> Option<Vec<GoodInStock>> {
        let guard = self.outposts.read().await;
        Some(Self::sorted_goods(guard.get(outpost_id)?, true))
    }

    /// Goods of an outpost in catalog order, ignoring trades.
    pub async fn catalog(&self, outpost_id: &str) -> Option<Vec<GoodInStock>> {
        let guard = self.outposts.read().await;
        Some(Self::sorted_goods(guard.get(outpost_id)?, false))
    }

    pub async fn find_stock(&self, good: &str, outpost_id: &str) -> Option<GoodInStock> {
        self.entry(good, outpost_id).await.map(|e| e.to_good())
    }

    /// Replace an outpost's whole catalog. Used when loading seeds or hydrating
    /// from the database, never by settlement. Goods already traded keep their
    /// relative order by `last_traded`.
    pub async fn update_outpost_goods(&self, outpost_id: &str, goods: Vec<GoodInStock>) {
        let entries: Vec<Arc<StockEntry>> = goods
            .into_iter()
            .map(|mut good| {
                good.outpost_id = outpost_id.to_string();
                self.make_entry(&good)
            })
            .collect();

        let mut traded: Vec<(DateTime<Utc>, &Arc<StockEntry>)> = entries
            .iter()
            .filter_map(|e| e.listing().last_traded.map(|t| (t, e)))
            .collect();
        traded.sort_by_key(|(t, e)| (*t, e.seq));
        for (_, entry) in traded {
            entry.listing().trade_seq = Some(self.next_trade_seq.fetch_add(1, Ordering::Relaxed));
        }

        let catalog: HashMap<String, Arc<StockEntry>> =
            entries.into_iter().map(|e| (e.name.clone(), e)).collect();
        let mut guard = self.outposts.write().await;
        guard.insert(outpost_id.to_string(), catalog);
    }

    /// Remove `quantity` units if at least that many are available. The check
    /// and the decrement are one atomic step.
    pub async fn take(&self, good: &str, outpost_id: &str, quantity: Qty) -> Result<Qty, TradeError> {
        let entry = self
            .entry(good, outpost_id)
            .await
            .ok_or_else(|| TradeError::GoodNotFound {
                good: good.to_string(),
                outpost_id: outpost_id.to_string(),
            })?;
        entry
            .quantity
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(quantity)
            })
            .map(|previous| previous - quantity)
            .map_err(|_| TradeError::Conflict {
                good: good.to_string(),
                outpost_id: outpost_id.to_string(),
            })
    }

    /// Undo a `take` whose settlement could not be committed.
    pub async fn give_back(&self, good: &str, outpost_id: &str, quantity: Qty) {
        match self.entry(good, outpost_id).await {
            Some(entry) => {
                entry.quantity.fetch_add(quantity, Ordering::AcqRel);
            }
            None => {
                tracing::error!(good, outpost_id, quantity, "stock record vanished before give back");
            }
        }
    }

    /// Add `quantity` units and set the ask price and unit. Creates the record
    /// at the end of the catalog if the outpost does not list the good yet.
    pub async fn put(
        &self,
        good: &str,
        outpost_id: &str,
        quantity: Qty,
        price: Price,
        unit: &str,
        now: DateTime<Utc>,
    ) -> Result<GoodInStock, TradeError> {
        let entry = match self.entry(good, outpost_id).await {
            Some(entry) => entry,
            None => {
                let mut guard = self.outposts.write().await;
                let catalog = guard
                    .get_mut(outpost_id)
                    .ok_or_else(|| TradeError::OutpostNotFound(outpost_id.to_string()))?;
                if let Some(existing) = catalog.get(good) {
                    existing.clone()
                } else {
                    let fresh = self.make_entry(&GoodInStock {
                        name: good.to_string(),
                        outpost_id: outpost_id.to_string(),
                        price,
                        quantity: 0,
                        unit: unit.to_string(),
                        last_updated: now,
                        last_traded: None,
                    });
                    catalog.insert(good.to_string(), fresh.clone());
                    fresh
                }
            }
        };

        {
            let mut listing = entry.listing();
            entry
                .quantity
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    current.checked_add(quantity)
                })
                .map_err(|_| TradeError::InvalidArgument("stock quantity overflow".to_string()))?;
            listing.price = price;
            listing.unit = unit.to_string();
            listing.last_updated = now;
        }
        Ok(entry.to_good())
    }

    /// Flag the good as the most recently traded one at its outpost. The view
    /// follows the order of these calls, not the timestamps passed in.
    pub async fn mark_traded(&self, good: &str, outpost_id: &str, now: DateTime<Utc>) {
        if let Some(entry) = self.entry(good, outpost_id).await {
            let mut listing = entry.listing();
            listing.trade_seq = Some(self.next_trade_seq.fetch_add(1, Ordering::Relaxed));
            listing.last_traded = Some(now);
            listing.last_updated = now;
        }
    }
}
