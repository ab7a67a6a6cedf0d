//! Writes one settled trade in a single transaction.
//!
//! The ledger row goes first: if the trade id is already present the whole
//! trade was committed earlier and the retry is a no-op.

use sqlx::PgPool;

use crate::error::TradeError;
use crate::persistence::{players, stock, trades};
use crate::types::holding::Holding;
use crate::types::trade::TradeRecord;

fn conflict(record: &TradeRecord) -> TradeError {
    TradeError::Conflict {
        good: record.good_name.clone(),
        outpost_id: record.outpost_id.clone(),
    }
}

pub async fn persist_purchase(pool: &PgPool, record: &TradeRecord, holding: &Holding) -> Result<(), TradeError> {
    let mut tx = pool.begin().await?;
    if !trades::insert_trade(&mut tx, record).await? {
        tracing::warn!(trade_id = %record.id, "purchase already persisted");
        tx.rollback().await?;
        return Ok(());
    }
    if !stock::take_stock(&mut tx, &record.outpost_id, &record.good_name, record.quantity, record.created_at).await? {
        tx.rollback().await?;
        return Err(conflict(record));
    }
    if !players::adjust_money(&mut tx, &record.username, -record.total_price).await? {
        tx.rollback().await?;
        return Err(conflict(record));
    }
    players::upsert_holding(&mut tx, &record.username, &record.good_name, holding).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn persist_sell(
    pool: &PgPool,
    record: &TradeRecord,
    holding: &Holding,
    unit: &str,
) -> Result<(), TradeError> {
    let mut tx = pool.begin().await?;
    if !trades::insert_trade(&mut tx, record).await? {
        tracing::warn!(trade_id = %record.id, "sell already persisted");
        tx.rollback().await?;
        return Ok(());
    }
    players::upsert_holding(&mut tx, &record.username, &record.good_name, holding).await?;
    stock::put_stock(
        &mut tx,
        &record.outpost_id,
        &record.good_name,
        record.quantity,
        record.unit_price,
        unit,
        record.created_at,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}
