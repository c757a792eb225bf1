// src/connectors/provider.rs
use crate::config::ProviderConfig;
use crate::connectors::messages::{CandleQuery, CandleRequest, CandlesResponse};
use crate::connectors::traits::MarketDataProvider;
use crate::errors::{Result, StrategyError};
use crate::types::Candle;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// REST client of the market-data provider proxy.
pub struct ProviderClient {
    api_key: String,
    access_token: String,
    http_client: Client,
    base_rest_url: String,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            http_client: builder.build()?,
            base_rest_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn candles_url(&self, request: &CandleRequest) -> Result<Url> {
        let query = serde_urlencoded::to_string(CandleQuery {
            granularity: &request.granularity,
            start: request.start,
            end: request.end,
        })
        .map_err(|e| StrategyError::ProviderCandles(e.to_string()))?;

        let url = format!(
            "{}/api/v3/brokerage/products/{}/candles?{}",
            self.base_rest_url, request.product_id, query
        );
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl MarketDataProvider for ProviderClient {
    async fn get_candles(&self, request: &CandleRequest) -> Result<Vec<Candle>> {
        let url = self.candles_url(request)?;
        debug!(%url, "Requesting candles");

        let response = self
            .http_client
            .get(url.clone())
            .header("Content-Type", "application/json")
            .header("x-correlation-id", &request.correlation_id)
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Candle request failed");
                StrategyError::ProviderCandles(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                response = %body,
                request_url = %url,
                correlation_id = %request.correlation_id,
                "Bad response getting candles"
            );
            return Err(StrategyError::ProviderCandles(format!(
                "Error getting candles (status {})",
                status
            )));
        }

        let body = response
            .json::<CandlesResponse>()
            .await
            .map_err(|e| StrategyError::ProviderCandles(e.to_string()))?;
        Ok(body.candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candles_url() {
        let client = ProviderClient::new(&ProviderConfig {
            base_url: "https://provider.example/".to_string(),
            api_key: "key".to_string(),
            access_token: "token".to_string(),
            timeout_secs: Some(10),
        })
        .unwrap();

        let url = client
            .candles_url(&CandleRequest {
                correlation_id: "c1".to_string(),
                product_id: "BTC-USD".to_string(),
                start: 1_700_000_000,
                end: 1_700_018_000,
                granularity: "1".to_string(),
            })
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://provider.example/api/v3/brokerage/products/BTC-USD/candles?granularity=1&start=1700000000&end=1700018000"
        );
    }
}
