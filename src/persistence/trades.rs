//! Trade ledger persistence: idempotent insert and history listing.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::types::trade::{TradeRecord, TradeType};

#[derive(Debug, FromRow)]
pub struct TradeRow {
    pub id: Uuid,
    pub username: String,
    pub good_name: String,
    pub quantity: i64,
    pub outpost_id: String,
    pub trade_type: String,
    pub unit_price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

/// Skips rows with an unknown trade type.
pub fn trade_row_to_record(row: TradeRow) -> Option<TradeRecord> {
    let trade_type = TradeType::parse(&row.trade_type)?;
    Some(TradeRecord {
        id: row.id,
        username: row.username,
        good_name: row.good_name,
        quantity: row.quantity.max(0) as u64,
        outpost_id: row.outpost_id,
        trade_type,
        unit_price: row.unit_price,
        total_price: row.total_price,
        created_at: row.created_at,
    })
}

/// Insert a trade keyed by its pre-generated id. Returns false when the id was
/// already written, which makes retries safe.
pub async fn insert_trade(conn: &mut PgConnection, record: &TradeRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO trades (id, username, good_name, quantity, outpost_id, trade_type, unit_price, total_price, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (id) DO NOTHING",
    )
    .bind(record.id)
    .bind(&record.username)
    .bind(&record.good_name)
    .bind(record.quantity as i64)
    .bind(&record.outpost_id)
    .bind(record.trade_type.as_str())
    .bind(record.unit_price)
    .bind(record.total_price)
    .bind(record.created_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Full ledger in commit order, for hydration.
pub async fn list_trades(pool: &PgPool) -> Result<Vec<TradeRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TradeRow>(
        "SELECT id, username, good_name, quantity, outpost_id, trade_type, unit_price, total_price, created_at \
         FROM trades ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(trade_row_to_record).collect())
}
