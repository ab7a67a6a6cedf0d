use outpost_exchange::api::routes::{AppState, app_router};
use outpost_exchange::config::Config;
use outpost_exchange::persistence::{create_pool_and_migrate, hydrate, save_world};
use outpost_exchange::seed::{World, WorldSeed};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = match &config.database_url {
        Some(url) => Some(create_pool_and_migrate(url, config.db_max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, trades will not be persisted");
            None
        }
    };

    let world = match &db {
        Some(pool) => hydrate(pool).await?,
        None => World::new(),
    };

    // Seed only a world that has no outposts yet.
    if let Some(path) = &config.world_seed_path {
        if world.stock.outpost_ids().await.is_empty() {
            let seed = WorldSeed::load_from_file(path).await?;
            seed.apply(&world).await?;
            if let Some(pool) = &db {
                save_world(pool, &world).await?;
            }
            tracing::info!(
                path = %path.display(),
                outposts = seed.outposts.len(),
                players = seed.players.len(),
                "world seeded"
            );
        }
    }

    let app = app_router(AppState {
        engine: world.into_engine(db),
    });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
