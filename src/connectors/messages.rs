// src/connectors/messages.rs
use crate::types::{Candle, Position, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- Market data ---

#[derive(Debug, Clone, PartialEq)]
pub struct CandleRequest {
    pub correlation_id: String,
    pub product_id: String,
    /// Unix seconds.
    pub start: i64,
    /// Unix seconds.
    pub end: i64,
    pub granularity: String,
}

/// Query string of `GET /api/v3/brokerage/products/{product_id}/candles`.
#[derive(Debug, Serialize)]
pub struct CandleQuery<'a> {
    pub granularity: &'a str,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<Candle>,
}

// --- Technical indicators ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRequest {
    pub historical_data: Vec<Candle>,
    pub product_id: String,
    pub provider: String,
    pub n1: usize,
    pub n2: usize,
    pub strategy_term: String,
    pub correlation_id: String,
    pub indicators: Vec<String>,
    pub candle_stick_scope: usize,
    pub support_resistance_tolerance: Decimal,
}

pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResponse {
    pub status: String,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndicatorResponse {
    pub fn success(signals: Vec<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            signals,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            signals: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

// --- Assistant ---

#[derive(Debug, Serialize)]
pub struct NotificationRequest<'a> {
    pub message: &'a str,
    pub webhook_channel: &'a str,
}

// --- Queues ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Raw candle archive.
    DataCollection,
    /// Risk management, next hop towards order execution.
    Risk,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::DataCollection => "data_collection",
            Destination::Risk => "risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub destination: Destination,
    pub body: serde_json::Value,
    pub attributes: BTreeMap<String, String>,
}

/// What is POSTed to a queue endpoint.
#[derive(Debug, Serialize)]
pub struct QueueEnvelope<'a> {
    pub message_body: &'a serde_json::Value,
    pub message_attributes: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DataCollectionMessage<'a> {
    pub data_collection_type: &'static str,
    pub candle_stick_data: &'a [Candle],
}

// --- Strategy trigger (inbound) and decision (outbound) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One queued request to evaluate a product.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyTrigger {
    #[serde(default)]
    pub correlation_id: Option<String>,
    pub provider: String,
    pub product: Product,
    #[serde(default)]
    pub portfolio: serde_json::Value,
    #[serde(default)]
    pub positions: Vec<Position>,
    pub strategy_term: String,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub assistant_event: bool,
}

/// Queue delivery wrapper: `{"Records": [{"body": "<trigger json>"}]}`.
#[derive(Debug, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
pub struct QueueRecord {
    pub body: String,
}

/// Decision published to the risk queue.
#[derive(Debug, Clone, Serialize)]
pub struct RiskMessage {
    pub portfolio: serde_json::Value,
    pub product: Product,
    pub correlation_id: String,
    pub provider: String,
    pub config: serde_json::Value,
    pub side: Side,
    pub positions: Vec<Position>,
    pub strategy_term: String,
    pub historical_data: Vec<Candle>,
    pub risk_flags: Vec<String>,
    pub assistant_event: bool,
}
