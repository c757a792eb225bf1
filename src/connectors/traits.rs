use crate::connectors::messages::{
    CandleRequest, IndicatorRequest, IndicatorResponse, OutboundMessage,
};
use crate::errors::Result;
use crate::types::Candle;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Candles for the requested window, newest first.
    async fn get_candles(&self, request: &CandleRequest) -> Result<Vec<Candle>>;
}

#[async_trait]
pub trait IndicatorService: Send + Sync {
    async fn compute(&self, request: &IndicatorRequest) -> Result<IndicatorResponse>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, correlation_id: &str, message: &str) -> Result<()>;
}

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: OutboundMessage) -> Result<()>;
}
