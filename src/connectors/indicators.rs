// src/connectors/indicators.rs
use crate::config::IndicatorsConfig;
use crate::connectors::messages::{IndicatorRequest, IndicatorResponse};
use crate::connectors::traits::IndicatorService;
use crate::errors::{Result, StrategyError};
use crate::types::Candle;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use ta::indicators::SimpleMovingAverage;
use ta::Next;
use tracing::warn;
use url::Url;

/// Remote indicator compute endpoint (request/response JSON).
pub struct HttpIndicatorClient {
    api_key: Option<String>,
    http_client: Client,
    url: Url,
}

impl HttpIndicatorClient {
    pub fn new(url: &str, config: &IndicatorsConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            http_client: Client::new(),
            url: Url::parse(url)?,
        })
    }
}

#[async_trait]
impl IndicatorService for HttpIndicatorClient {
    async fn compute(&self, request: &IndicatorRequest) -> Result<IndicatorResponse> {
        let mut builder = self
            .http_client
            .post(self.url.clone())
            .header("x-correlation-id", &request.correlation_id)
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StrategyError::IndicatorCompute(e.to_string()))?;

        // Error statuses still carry a JSON body with `status`/`error`.
        let body = response
            .json::<IndicatorResponse>()
            .await
            .map_err(|e| StrategyError::IndicatorCompute(e.to_string()))?;
        Ok(body)
    }
}

/// In-process SMA crossover signals, used when no remote service is configured.
#[derive(Debug, Default)]
pub struct LocalIndicators;

impl LocalIndicators {
    pub fn new() -> Self {
        Self
    }
}

/// Fast/slow SMA crossover over candles given newest-first.
/// Emits one signal each time the fast average crosses to the other side.
fn sma_cross_signals(
    candles: &[Candle],
    n1: usize,
    n2: usize,
) -> std::result::Result<Vec<String>, String> {
    let mut fast = SimpleMovingAverage::new(n1).map_err(|e| format!("{:?}", e))?;
    let mut slow = SimpleMovingAverage::new(n2).map_err(|e| format!("{:?}", e))?;
    let mut position = 0i8; // 0 = flat, 1 = long, -1 = short
    let mut signals = Vec::new();

    for candle in candles.iter().rev() {
        let price = candle.close.to_f64().unwrap_or(0.0);
        let fast_val = fast.next(price);
        let slow_val = slow.next(price);

        if fast_val > slow_val && position <= 0 {
            signals.push(format!("SMA Signal: Buy at price: {}", candle.close));
            position = 1;
        } else if fast_val < slow_val && position >= 0 {
            signals.push(format!("SMA Signal: Sell at price: {}", candle.close));
            position = -1;
        }
    }

    Ok(signals)
}

#[async_trait]
impl IndicatorService for LocalIndicators {
    async fn compute(&self, request: &IndicatorRequest) -> Result<IndicatorResponse> {
        if request.n1 >= request.n2 {
            return Ok(IndicatorResponse::failure("n1 must be less than n2"));
        }
        if request.historical_data.len() < request.n2 {
            return Ok(IndicatorResponse::failure(
                "Insufficient data for the specified SMA periods",
            ));
        }

        let mut signals = Vec::new();
        for indicator in &request.indicators {
            match indicator.as_str() {
                "sma" => match sma_cross_signals(&request.historical_data, request.n1, request.n2)
                {
                    Ok(sma) => signals.extend(sma),
                    Err(e) => return Ok(IndicatorResponse::failure(e)),
                },
                other => {
                    warn!(indicator = other, "Unsupported indicator requested");
                    return Ok(IndicatorResponse::failure(format!(
                        "unsupported indicator: {}",
                        other
                    )));
                }
            }
        }

        Ok(IndicatorResponse::success(signals))
    }
}
