//! Trade Ledger: append-only history of executed trades, deduplicated by trade id.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::players::normalize_username;
use crate::types::trade::TradeRecord;

#[derive(Default)]
struct LedgerInner {
    records: Vec<TradeRecord>,
    index: HashMap<Uuid, usize>,
}

#[derive(Default)]
pub struct TradeLedger {
    inner: RwLock<LedgerInner>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns false and leaves the ledger untouched when a
    /// record with the same id was already written.
    pub async fn append(&self, record: TradeRecord) -> bool {
        let mut guard = self.inner.write().await;
        if guard.index.contains_key(&record.id) {
            return false;
        }
        let pos = guard.records.len();
        guard.index.insert(record.id, pos);
        guard.records.push(record);
        true
    }

    pub async fn get(&self, trade_id: Uuid) -> Option<TradeRecord> {
        let guard = self.inner.read().await;
        guard.index.get(&trade_id).map(|&pos| guard.records[pos].clone())
    }

    /// Most recent trades of one player first.
    pub async fn for_player(&self, username: &str, limit: usize) -> Vec<TradeRecord> {
        let username = normalize_username(username);
        self.inner
            .read()
            .await
            .records
            .iter()
            .rev()
            .filter(|r| r.username == username)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
