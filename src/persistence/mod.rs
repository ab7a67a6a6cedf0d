//! Database layer: pool, migrations, and writes for stock, players, holdings and trades.

mod hydrate;
mod players;
mod pool;
mod settlement;
mod stock;
mod trades;

pub use hydrate::{hydrate, save_world};
pub use pool::{create_pool_and_migrate, run_migrations};
pub use settlement::{persist_purchase, persist_sell};
pub use sqlx::PgPool;
