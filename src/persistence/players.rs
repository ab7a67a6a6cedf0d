//! Player persistence: accounts, guarded money changes and holdings.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::types::good::Price;
use crate::types::holding::Holding;

#[derive(Debug, FromRow)]
pub struct PlayerRow {
    pub username: String,
    pub current_outpost: String,
    pub money: i64,
}

#[derive(Debug, FromRow)]
pub struct HoldingRow {
    pub username: String,
    pub good_name: String,
    pub quantity: i64,
    pub average_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub trade_ids: Vec<Uuid>,
}

pub fn holding_row_to_holding(row: HoldingRow) -> (String, String, Holding) {
    let holding = Holding {
        quantity: row.quantity.max(0) as u64,
        average_price: row.average_price,
        created_at: row.created_at,
        updated_at: row.updated_at,
        trade_ids: row.trade_ids,
    };
    (row.username, row.good_name, holding)
}

/// Insert or overwrite a player (seeding only). Username must already be lowercase.
pub async fn upsert_player(
    conn: &mut PgConnection,
    username: &str,
    current_outpost: &str,
    money: Price,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO players (username, current_outpost, money) VALUES ($1, $2, $3) \
         ON CONFLICT (username) DO UPDATE SET current_outpost = $2, money = $3",
    )
    .bind(username)
    .bind(current_outpost)
    .bind(money)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn list_players(pool: &PgPool) -> Result<Vec<PlayerRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PlayerRow>("SELECT username, current_outpost, money FROM players")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Relative money change that refuses to go below zero. Returns false if refused.
pub async fn adjust_money(conn: &mut PgConnection, username: &str, delta: Price) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE players SET money = money + $1 WHERE username = $2 AND money + $1 >= 0")
        .bind(delta)
        .bind(username)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn upsert_holding(
    conn: &mut PgConnection,
    username: &str,
    good_name: &str,
    holding: &Holding,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO holdings (username, good_name, quantity, average_price, created_at, updated_at, trade_ids) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (username, good_name) DO UPDATE SET quantity = $3, average_price = $4, \
         updated_at = $6, trade_ids = $7",
    )
    .bind(username)
    .bind(good_name)
    .bind(holding.quantity as i64)
    .bind(holding.average_price)
    .bind(holding.created_at)
    .bind(holding.updated_at)
    .bind(&holding.trade_ids)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn list_holdings(pool: &PgPool) -> Result<Vec<HoldingRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT username, good_name, quantity, average_price, created_at, updated_at, trade_ids FROM holdings",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
