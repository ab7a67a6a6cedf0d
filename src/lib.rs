pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod persistence;
pub mod players;
pub mod seed;
pub mod settlement;
pub mod stock;
pub mod types;
