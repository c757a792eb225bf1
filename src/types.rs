// src/types.rs
use crate::errors::StrategyError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SERVICE: &str = "strategy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holding horizon. Controls lookback window, granularity and gate thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyTerm {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl StrategyTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTerm::ShortTerm => "SHORT_TERM",
            StrategyTerm::MediumTerm => "MEDIUM_TERM",
            StrategyTerm::LongTerm => "LONG_TERM",
        }
    }
}

impl fmt::Display for StrategyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyTerm {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHORT_TERM" => Ok(StrategyTerm::ShortTerm),
            "MEDIUM_TERM" => Ok(StrategyTerm::MediumTerm),
            "LONG_TERM" => Ok(StrategyTerm::LongTerm),
            other => Err(StrategyError::InvalidStrategyTerm(other.to_string())),
        }
    }
}

/// One OHLCV bucket as returned by the market-data provider.
///
/// Lists of candles are always newest-first: index 0 is the most recent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(alias = "start", deserialize_with = "unix_seconds")]
    pub open_time: i64,
    #[serde(
        default,
        deserialize_with = "optional_unix_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub close_time: Option<i64>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

// Provider encodes timestamps as strings ("1639508050"), replays use numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Int(i64),
    Text(String),
}

impl RawTimestamp {
    fn into_seconds<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            RawTimestamp::Int(v) => Ok(v),
            RawTimestamp::Text(s) => s.trim().parse::<i64>().map_err(E::custom),
        }
    }
}

fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    RawTimestamp::deserialize(deserializer)?.into_seconds()
}

fn optional_unix_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(raw) => raw.into_seconds().map(Some),
        None => Ok(None),
    }
}

fn default_position_term() -> Option<String> {
    Some(StrategyTerm::MediumTerm.as_str().to_string())
}

/// An existing holding from the upstream portfolio snapshot.
///
/// Only the fields the engine reads are typed; everything else in the
/// upstream order record is kept in `extra` and republished untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub position_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub side: String,
    #[serde(default = "default_position_term")]
    pub strategy_term: Option<String>,
    pub filled_size: Decimal,
    pub average_filled_price: Decimal,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Med,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Med => "MED",
            RiskLevel::High => "HIGH",
        }
    }
}

/// The step of the run that raised a risk flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSource {
    OrderSide,
    StrategyRun,
}

impl RiskSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskSource::OrderSide => "ORDER_SIDE",
            RiskSource::StrategyRun => "STRATEGY_RUN",
        }
    }
}

/// Coarse confidence label for downstream risk management.
/// Rendered as `strategy_{SOURCE}_{LEVEL}`, e.g. `strategy_ORDER_SIDE_HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskFlag {
    pub source: RiskSource,
    pub level: RiskLevel,
}

impl RiskFlag {
    pub fn new(source: RiskSource, level: RiskLevel) -> Self {
        Self { source, level }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            SERVICE,
            self.source.as_str(),
            self.level.as_str()
        )
    }
}

impl Serialize for RiskFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output of one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub side: Side,
    pub historical_data: Vec<Candle>,
    pub positions: Vec<Position>,
    pub risk_flags: Vec<RiskFlag>,
}
