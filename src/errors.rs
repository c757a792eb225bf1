// src/errors.rs
use rust_decimal::Decimal;
use thiserror::Error;

/// Hard failures of a strategy run.
///
/// Expected business outcomes (trend not confirmed, a position not worth
/// selling yet, nothing to sell on an explicit sell) are not errors; they are
/// variants of the outcome enums in `strategies::momentum`.
#[derive(Error, Debug)]
pub enum StrategyError {
    // -- Arguments ----------------------------------------------------------
    #[error("invalid strategy term: {0}")]
    InvalidStrategyTerm(String),

    #[error("strategy term {term} does not support {operation}")]
    UnsupportedTerm {
        term: &'static str,
        operation: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid strategy event: {0}")]
    InvalidEvent(String),

    // -- Data ---------------------------------------------------------------
    #[error("insufficient historical data: need at least {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("position {position_id} has no cost basis")]
    InvalidPosition { position_id: String },

    #[error("decimal overflow computing {0}")]
    Overflow(&'static str),

    // -- Gates --------------------------------------------------------------
    #[error("max/min diff pct check failed: {diff_pct}%")]
    BuyRejected { diff_pct: Decimal },

    // -- Collaborators ------------------------------------------------------
    #[error("failed to get provider candles: {0}")]
    ProviderCandles(String),

    #[error("technical indicator computation failed: {0}")]
    IndicatorCompute(String),

    #[error("could not send message to assistant: {0}")]
    Notification(String),

    #[error("failed to publish message to {destination}: {reason}")]
    Publish { destination: String, reason: String },

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
