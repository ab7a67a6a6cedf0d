//! Concurrent settlement: stock never goes negative and no unit is lost.

use chrono::Utc;
use outpost_exchange::error::TradeError;
use outpost_exchange::inventory::Inventory;
use outpost_exchange::seed::World;
use outpost_exchange::settlement::engine::SettlementEngine;
use outpost_exchange::types::good::GoodInStock;

const BUYERS: usize = 64;

async fn engine_with_stock(quantity: u64) -> SettlementEngine {
    let world = World::new();
    world
        .stock
        .update_outpost_goods(
            "kashgar",
            vec![GoodInStock {
                name: "Porcelain".to_string(),
                outpost_id: "kashgar".to_string(),
                price: 3,
                quantity,
                unit: "piece".to_string(),
                last_updated: Utc::now(),
                last_traded: None,
            }],
        )
        .await;
    for i in 0..BUYERS {
        world
            .players
            .register_player(&format!("buyer{i}"), "kashgar", 100, Inventory::new())
            .await
            .unwrap();
    }
    world.into_engine(None)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn n_concurrent_single_unit_purchases_drain_stock_exactly() {
    let engine = engine_with_stock(BUYERS as u64).await;

    let handles: Vec<_> = (0..BUYERS)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.purchase(&format!("buyer{i}"), "Porcelain", 1, "kashgar").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stock = engine.stock().find_stock("Porcelain", "kashgar").await.unwrap();
    assert_eq!(stock.quantity, 0);
    assert_eq!(engine.ledger().len().await, BUYERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn oversubscribed_purchases_sell_exactly_the_stock() {
    let available = (BUYERS / 2) as u64;
    let engine = engine_with_stock(available).await;

    let handles: Vec<_> = (0..BUYERS)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.purchase(&format!("buyer{i}"), "Porcelain", 1, "kashgar").await })
        })
        .collect();

    let mut settled = 0u64;
    let mut held = 0u64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                settled += 1;
                held += receipt.holding_quantity;
            }
            Err(TradeError::InsufficientStock { .. }) | Err(TradeError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let stock = engine.stock().find_stock("Porcelain", "kashgar").await.unwrap();
    assert_eq!(settled, available);
    assert_eq!(held, available);
    assert_eq!(stock.quantity, 0);
    assert_eq!(engine.ledger().len().await as u64, available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_sells_and_purchases_conserve_units() {
    let engine = engine_with_stock(BUYERS as u64).await;
    for i in 0..BUYERS {
        engine.purchase(&format!("buyer{i}"), "Porcelain", 1, "kashgar").await.unwrap();
    }

    let handles: Vec<_> = (0..BUYERS)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let username = format!("buyer{i}");
                if i % 2 == 0 {
                    engine.sell(&username, "Porcelain", 1, "kashgar", 3, "piece").await
                } else {
                    engine.purchase(&username, "Porcelain", 1, "kashgar").await
                }
            })
        })
        .collect();
    let results: Vec<_> = join_all(handles).await;

    let stock = engine.stock().find_stock("Porcelain", "kashgar").await.unwrap().quantity;
    let mut held = 0;
    for i in 0..BUYERS {
        let snapshot = engine.players().snapshot(&format!("buyer{i}")).await.unwrap();
        held += snapshot.inventory.get("Porcelain").map_or(0, |h| h.quantity);
    }
    assert_eq!(stock + held, BUYERS as u64);
    assert!(results.iter().all(|r| r.is_ok() || matches!(r, Err(TradeError::InsufficientStock { .. }) | Err(TradeError::Conflict { .. }))));
}

async fn join_all<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}
