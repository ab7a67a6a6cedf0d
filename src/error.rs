//! Error taxonomy for settlement, storage and configuration.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::types::good::{Price, Qty};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeError {
    #[error("Outpost '{0}' not found")]
    OutpostNotFound(String),

    #[error("Good '{good}' not found at outpost '{outpost_id}'")]
    GoodNotFound { good: String, outpost_id: String },

    #[error("Player '{0}' not found")]
    PlayerNotFound(String),

    #[error("Player '{username}' not found at outpost '{outpost_id}'")]
    PlayerNotAtOutpost { username: String, outpost_id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: Qty, available: Qty },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Price, available: Price },

    #[error("Insufficient holding of '{good}': requested {requested}, held {held}")]
    InsufficientHolding { good: String, requested: Qty, held: Qty },

    #[error("Player is at outpost '{current}', not '{requested}'")]
    WrongLocation { current: String, requested: String },

    #[error("Concurrent update on '{good}' at outpost '{outpost_id}', retry the trade")]
    Conflict { good: String, outpost_id: String },

    /// Internal storage failure. The detail is logged, never returned to callers.
    #[error("Internal storage failure")]
    Storage(String),
}

impl TradeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TradeError::OutpostNotFound(_)
            | TradeError::GoodNotFound { .. }
            | TradeError::PlayerNotFound(_)
            | TradeError::PlayerNotAtOutpost { .. } => StatusCode::NOT_FOUND,
            TradeError::InvalidArgument(_)
            | TradeError::InsufficientStock { .. }
            | TradeError::InsufficientFunds { .. }
            | TradeError::InsufficientHolding { .. }
            | TradeError::WrongLocation { .. } => StatusCode::BAD_REQUEST,
            TradeError::Conflict { .. } => StatusCode::CONFLICT,
            TradeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for TradeError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error during settlement");
        TradeError::Storage(err.to_string())
    }
}

impl IntoResponse for TradeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read seed file: {0}")]
    SeedIo(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),
}
