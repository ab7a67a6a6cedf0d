pub mod good;
pub mod holding;
pub mod player;
pub mod trade;
