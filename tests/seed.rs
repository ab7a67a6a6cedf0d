//! World seed loading and application.

use outpost_exchange::error::TradeError;
use outpost_exchange::seed::{World, WorldSeed};
use std::path::Path;

#[tokio::test]
async fn bundled_seed_populates_world() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("seed/world.json");
    let seed = WorldSeed::load_from_file(&path).await.unwrap();
    let world = World::new();

    seed.apply(&world).await.unwrap();

    let venice = world.stock.find_outpost("venice").await.unwrap();
    let names: Vec<&str> = venice.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Glassware", "Wine"]);
    assert!(venice.iter().all(|g| g.outpost_id == "venice"));

    let marco = world.players.snapshot("marco").await.unwrap();
    assert_eq!(marco.current_outpost, "venice");
    assert_eq!(marco.money, 1000);
    assert!(marco.inventory.is_empty());
}

#[tokio::test]
async fn seeded_world_can_trade() {
    let seed: WorldSeed = serde_json::from_value(serde_json::json!({
        "outposts": [{ "id": "kashgar", "goods_available": [
            { "name": "Gems", "price": 40, "quantity": 2, "unit": "carat" }
        ]}],
        "players": [{ "username": "Niccolo", "current_outpost": "kashgar", "money": 100 }]
    }))
    .unwrap();
    let world = World::new();
    seed.apply(&world).await.unwrap();
    let engine = world.into_engine(None);

    let receipt = engine.purchase("niccolo", "Gems", 2, "kashgar").await.unwrap();
    assert_eq!(receipt.money, 20);
}

#[tokio::test]
async fn seed_rejects_non_positive_price() {
    let seed: WorldSeed = serde_json::from_value(serde_json::json!({
        "outposts": [{ "id": "kashgar", "goods_available": [
            { "name": "Gems", "price": 0, "quantity": 2, "unit": "carat" }
        ]}]
    }))
    .unwrap();

    let err = seed.apply(&World::new()).await.unwrap_err();
    assert!(matches!(err, TradeError::InvalidArgument(_)));
}

#[tokio::test]
async fn missing_seed_file_is_an_error() {
    let res = WorldSeed::load_from_file(Path::new("does/not/exist.json")).await;
    assert!(res.is_err());
}
