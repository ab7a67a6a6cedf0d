//! Load in-memory state from the database, or write a freshly seeded world to it.

use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::TradeError;
use crate::inventory::Inventory;
use crate::persistence::{players, stock, trades};
use crate::seed::World;
use crate::types::good::GoodInStock;
use crate::types::holding::Holding;

pub async fn hydrate(pool: &PgPool) -> Result<World, TradeError> {
    let world = World::new();

    let outposts = stock::list_outposts(pool).await?;
    for outpost_id in &outposts {
        world.stock.register_outpost(outpost_id).await;
    }
    let mut catalogs: HashMap<String, Vec<GoodInStock>> = HashMap::new();
    for good in stock::list_stock(pool).await? {
        catalogs.entry(good.outpost_id.clone()).or_default().push(good);
    }
    for (outpost_id, goods) in catalogs {
        world.stock.update_outpost_goods(&outpost_id, goods).await;
    }

    let mut inventories: HashMap<String, HashMap<String, Holding>> = HashMap::new();
    for row in players::list_holdings(pool).await? {
        let (username, good_name, holding) = players::holding_row_to_holding(row);
        inventories.entry(username).or_default().insert(good_name, holding);
    }
    let player_rows = players::list_players(pool).await?;
    for row in &player_rows {
        let holdings = inventories.remove(&row.username).unwrap_or_default();
        world
            .players
            .register_player(&row.username, &row.current_outpost, row.money, Inventory::from_holdings(holdings))
            .await?;
    }

    let mut trade_count = 0usize;
    for record in trades::list_trades(pool).await? {
        if world.ledger.append(record).await {
            trade_count += 1;
        }
    }

    tracing::info!(
        outposts = outposts.len(),
        players = player_rows.len(),
        trades = trade_count,
        "hydrated state from database"
    );
    Ok(world)
}

/// Write every outpost, listing, player and holding of `world` in one transaction.
pub async fn save_world(pool: &PgPool, world: &World) -> Result<(), TradeError> {
    let mut tx = pool.begin().await?;
    for outpost_id in world.stock.outpost_ids().await {
        stock::insert_outpost(&mut tx, &outpost_id).await?;
        let catalog = world.stock.catalog(&outpost_id).await.unwrap_or_default();
        for (position, good) in catalog.iter().enumerate() {
            stock::upsert_stock(&mut tx, good, position as i64).await?;
        }
    }
    for player in world.players.snapshots().await {
        players::upsert_player(&mut tx, &player.username, &player.current_outpost, player.money).await?;
        for (good_name, holding) in &player.inventory {
            players::upsert_holding(&mut tx, &player.username, good_name, holding).await?;
        }
    }
    tx.commit().await?;
    Ok(())
}
