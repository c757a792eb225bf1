pub mod momentum;
pub mod traits;

use crate::config::StrategyParams;
use crate::connectors::traits::{IndicatorService, MarketDataProvider, MessagePublisher, Notifier};
use crate::errors::{Result, StrategyError};
use crate::types::{Position, StrategyTerm};
use momentum::MomentumStrategy;
use std::sync::Arc;
use traits::Strategy;

/// External services a strategy run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub indicators: Arc<dyn IndicatorService>,
    pub notifier: Arc<dyn Notifier>,
    pub publisher: Arc<dyn MessagePublisher>,
}

pub const MOMENTUM: &str = "momentum";

/// Builds the strategy for the requested term. Only SHORT_TERM and
/// MEDIUM_TERM momentum strategies exist.
pub fn build_strategy(
    params: StrategyParams,
    positions: Vec<Position>,
    collaborators: Collaborators,
) -> Result<Box<dyn Strategy>> {
    if params.config.strategy_type != MOMENTUM {
        return Err(StrategyError::InvalidConfig(format!(
            "unsupported strategy type: {}",
            params.config.strategy_type
        )));
    }

    match params.context.term {
        StrategyTerm::ShortTerm | StrategyTerm::MediumTerm => Ok(Box::new(
            MomentumStrategy::new(params, positions, collaborators),
        )),
        StrategyTerm::LongTerm => Err(StrategyError::UnsupportedTerm {
            term: StrategyTerm::LongTerm.as_str(),
            operation: "strategy selection",
        }),
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::Collaborators;
    use crate::connectors::messages::{
        CandleRequest, IndicatorRequest, IndicatorResponse, OutboundMessage,
    };
    use crate::connectors::traits::{
        IndicatorService, MarketDataProvider, MessagePublisher, Notifier,
    };
    use crate::errors::{Result, StrategyError};
    use crate::types::{Candle, Position};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Mutex};

    pub fn position(id: &str, size: Decimal, price: Decimal) -> Position {
        Position {
            position_id: id.to_string(),
            product_id: Some("BTC-USD".to_string()),
            side: "BUY".to_string(),
            strategy_term: Some("MEDIUM_TERM".to_string()),
            filled_size: size,
            average_filled_price: price,
            extra: serde_json::Map::new(),
        }
    }

    struct FakeMarketData {
        candles: Vec<Candle>,
        fail: bool,
        requests: Arc<Mutex<Vec<CandleRequest>>>,
    }

    #[async_trait]
    impl MarketDataProvider for FakeMarketData {
        async fn get_candles(&self, request: &CandleRequest) -> Result<Vec<Candle>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(StrategyError::ProviderCandles("Error getting candles".into()));
            }
            Ok(self.candles.clone())
        }
    }

    struct FakeIndicators {
        response: IndicatorResponse,
    }

    #[async_trait]
    impl IndicatorService for FakeIndicators {
        async fn compute(&self, _request: &IndicatorRequest) -> Result<IndicatorResponse> {
            Ok(self.response.clone())
        }
    }

    struct FakeNotifier {
        fail: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, _correlation_id: &str, message: &str) -> Result<()> {
            if self.fail {
                return Err(StrategyError::Notification("assistant unreachable".into()));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct FakePublisher {
        published: Arc<Mutex<Vec<OutboundMessage>>>,
    }

    #[async_trait]
    impl MessagePublisher for FakePublisher {
        async fn publish(&self, message: OutboundMessage) -> Result<()> {
            self.published.lock().unwrap().push(message);
            Ok(())
        }
    }

    /// Scripted collaborators that record what they were asked to do.
    pub struct FakeWorld {
        candles: Vec<Candle>,
        market_data_fails: bool,
        notifier_fails: bool,
        indicators: IndicatorResponse,
        requests: Arc<Mutex<Vec<CandleRequest>>>,
        sent: Arc<Mutex<Vec<String>>>,
        published: Arc<Mutex<Vec<OutboundMessage>>>,
    }

    impl FakeWorld {
        pub fn new(candles: Vec<Candle>) -> Self {
            Self {
                candles,
                market_data_fails: false,
                notifier_fails: false,
                indicators: IndicatorResponse::success(vec!["SMA Signal: Buy at price: 1".into()]),
                requests: Arc::default(),
                sent: Arc::default(),
                published: Arc::default(),
            }
        }

        pub fn failing_market_data(mut self) -> Self {
            self.market_data_fails = true;
            self
        }

        pub fn failing_notifier(mut self) -> Self {
            self.notifier_fails = true;
            self
        }

        pub fn with_indicators(mut self, response: IndicatorResponse) -> Self {
            self.indicators = response;
            self
        }

        pub fn collaborators(&self) -> Collaborators {
            Collaborators {
                market_data: Arc::new(FakeMarketData {
                    candles: self.candles.clone(),
                    fail: self.market_data_fails,
                    requests: self.requests.clone(),
                }),
                indicators: Arc::new(FakeIndicators {
                    response: self.indicators.clone(),
                }),
                notifier: Arc::new(FakeNotifier {
                    fail: self.notifier_fails,
                    sent: self.sent.clone(),
                }),
                publisher: Arc::new(FakePublisher {
                    published: self.published.clone(),
                }),
            }
        }

        pub fn candle_requests(&self) -> Vec<CandleRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn notifications(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        pub fn published(&self) -> Vec<OutboundMessage> {
            self.published.lock().unwrap().clone()
        }
    }
}
