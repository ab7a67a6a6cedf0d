//! Stock persistence: outposts, listings and guarded quantity updates.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::types::good::{GoodInStock, Price, Qty};

#[derive(Debug, FromRow)]
pub struct StockRow {
    pub outpost_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub unit: String,
    pub last_updated: DateTime<Utc>,
    pub last_traded: Option<DateTime<Utc>>,
}

pub fn stock_row_to_good(row: StockRow) -> GoodInStock {
    GoodInStock {
        name: row.name,
        outpost_id: row.outpost_id,
        price: row.price,
        quantity: row.quantity.max(0) as u64,
        unit: row.unit,
        last_updated: row.last_updated,
        last_traded: row.last_traded,
    }
}

pub async fn insert_outpost(conn: &mut PgConnection, outpost_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO outposts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(outpost_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_outposts(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM outposts ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Write a listing with an absolute quantity at catalog `position` (seeding only).
pub async fn upsert_stock(conn: &mut PgConnection, good: &GoodInStock, position: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock (outpost_id, name, price, quantity, unit, last_updated, last_traded, position) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (outpost_id, name) DO UPDATE SET price = $3, quantity = $4, unit = $5, \
         last_updated = $6, last_traded = $7, position = $8",
    )
    .bind(&good.outpost_id)
    .bind(&good.name)
    .bind(good.price)
    .bind(good.quantity as i64)
    .bind(&good.unit)
    .bind(good.last_updated)
    .bind(good.last_traded)
    .bind(position)
    .execute(conn)
    .await?;
    Ok(())
}

/// Stock in catalog order, for hydration.
pub async fn list_stock(pool: &PgPool) -> Result<Vec<GoodInStock>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StockRow>(
        "SELECT outpost_id, name, price, quantity, unit, last_updated, last_traded \
         FROM stock ORDER BY outpost_id, position, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(stock_row_to_good).collect())
}

/// Guarded decrement. Returns false if fewer than `quantity` units remain.
pub async fn take_stock(
    conn: &mut PgConnection,
    outpost_id: &str,
    name: &str,
    quantity: Qty,
    traded_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE stock SET quantity = quantity - $1, last_traded = $4, last_updated = $4 \
         WHERE outpost_id = $2 AND name = $3 AND quantity >= $1",
    )
    .bind(quantity as i64)
    .bind(outpost_id)
    .bind(name)
    .bind(traded_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Increment quantity and set the ask price and unit. A new listing goes to the
/// end of the outpost's catalog.
pub async fn put_stock(
    conn: &mut PgConnection,
    outpost_id: &str,
    name: &str,
    quantity: Qty,
    price: Price,
    unit: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock (outpost_id, name, price, quantity, unit, last_updated, position) \
         VALUES ($1, $2, $3, $4, $5, $6, \
         (SELECT COALESCE(MAX(position) + 1, 0) FROM stock WHERE outpost_id = $1)) \
         ON CONFLICT (outpost_id, name) DO UPDATE SET quantity = stock.quantity + EXCLUDED.quantity, \
         price = EXCLUDED.price, unit = EXCLUDED.unit, last_updated = EXCLUDED.last_updated",
    )
    .bind(outpost_id)
    .bind(name)
    .bind(price)
    .bind(quantity as i64)
    .bind(unit)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
