// src/core/engine.rs
use crate::config::{AppConfig, EngineSettings, StrategyConfig, StrategyContext, StrategyParams};
use crate::connectors::assistant::AssistantClient;
use crate::connectors::indicators::{HttpIndicatorClient, LocalIndicators};
use crate::connectors::messages::{
    Destination, OutboundMessage, QueueEvent, RiskMessage, StrategyTrigger,
};
use crate::connectors::provider::ProviderClient;
use crate::connectors::queue::HttpQueuePublisher;
use crate::connectors::traits::IndicatorService;
use crate::errors::{Result, StrategyError};
use crate::strategies::momentum::RunOutcome;
use crate::strategies::{build_strategy, Collaborators};
use crate::types::{Side, StrategyTerm};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// What happened to one trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    /// A decision went to the risk queue.
    Published {
        correlation_id: String,
        side: Side,
        risk_flags: Vec<String>,
    },
    /// Sell was requested but nothing is worth selling; nothing published.
    NothingToSell { correlation_id: String },
}

/// Turns strategy triggers into published decisions.
pub struct StrategyEngine {
    settings: EngineSettings,
    collaborators: Collaborators,
}

impl StrategyEngine {
    pub fn new(settings: EngineSettings, collaborators: Collaborators) -> Self {
        Self {
            settings,
            collaborators,
        }
    }

    /// Wires the HTTP collaborators described by the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let indicators: Arc<dyn IndicatorService> = match &config.indicators.url {
            Some(url) if !url.is_empty() => {
                Arc::new(HttpIndicatorClient::new(url, &config.indicators)?)
            }
            _ => {
                info!("No indicator service configured, computing indicators in-process");
                Arc::new(LocalIndicators::new())
            }
        };

        let collaborators = Collaborators {
            market_data: Arc::new(ProviderClient::new(&config.provider)?),
            indicators,
            notifier: Arc::new(AssistantClient::new(&config.assistant)?),
            publisher: Arc::new(HttpQueuePublisher::new(&config.queues)),
        };
        Ok(Self::new(config.strategy.clone(), collaborators))
    }

    /// Accepts either a queue delivery (`{"Records": [{"body": ...}]}`) or a
    /// bare trigger object. Only the first record is handled.
    pub fn parse_event(raw: &str) -> Result<StrategyTrigger> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if value.get("Records").is_none() {
            return Ok(serde_json::from_value(value)?);
        }

        let event: QueueEvent = serde_json::from_value(value)?;
        let record = event
            .records
            .into_iter()
            .next()
            .ok_or_else(|| StrategyError::InvalidEvent("queue event has no records".into()))?;
        Ok(serde_json::from_str(&record.body)?)
    }

    pub async fn handle_event(&self, raw: &str) -> Result<HandleOutcome> {
        let trigger = Self::parse_event(raw)?;
        self.handle(trigger).await
    }

    pub async fn handle(&self, trigger: StrategyTrigger) -> Result<HandleOutcome> {
        let correlation_id = trigger
            .correlation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = info_span!(
            "strategy_handler",
            correlation_id = %correlation_id,
            product_id = %trigger.product.product_id,
            provider = %trigger.provider,
            strategy_term = %trigger.strategy_term,
        );

        async move {
            self.evaluate(trigger, correlation_id).await.map_err(|e| {
                error!(error = %e, "Failed to analyze product for buying/selling");
                e
            })
        }
        .instrument(span)
        .await
    }

    async fn evaluate(
        &self,
        trigger: StrategyTrigger,
        correlation_id: String,
    ) -> Result<HandleOutcome> {
        let term: StrategyTerm = trigger.strategy_term.parse()?;
        let context = StrategyContext::new(
            correlation_id.clone(),
            trigger.provider.clone(),
            trigger.product.product_id.clone(),
            term,
        )?;
        let config: StrategyConfig = if trigger.config.is_null() {
            StrategyConfig::default()
        } else {
            serde_json::from_value(trigger.config.clone())
                .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?
        };
        let params = StrategyParams::new(context, config, self.settings.clone())?;

        let strategy = build_strategy(params, trigger.positions.clone(), self.collaborators.clone())?;
        info!(strategy = %strategy.name(), requested_side = ?trigger.side, "Running strategy");

        let decision = match strategy.run(trigger.side).await? {
            RunOutcome::Decided(decision) => decision,
            RunOutcome::NoSellablePositions => {
                info!("Sell requested with no sellable positions, nothing to publish");
                return Ok(HandleOutcome::NothingToSell { correlation_id });
            }
        };

        let mut risk_flags = trigger.risk_flags.clone();
        risk_flags.extend(decision.risk_flags.iter().map(|f| f.to_string()));

        let message = RiskMessage {
            portfolio: trigger.portfolio,
            product: trigger.product,
            correlation_id: correlation_id.clone(),
            provider: trigger.provider,
            config: trigger.config,
            side: decision.side,
            positions: decision.positions,
            strategy_term: trigger.strategy_term,
            historical_data: decision.historical_data,
            risk_flags: risk_flags.clone(),
            assistant_event: trigger.assistant_event,
        };

        self.collaborators
            .publisher
            .publish(OutboundMessage {
                destination: Destination::Risk,
                body: serde_json::to_value(&message)?,
                attributes: BTreeMap::new(),
            })
            .await?;

        info!(side = %decision.side, risk_flags = ?risk_flags, "Analyzed product for buying/selling");
        Ok(HandleOutcome::Published {
            correlation_id,
            side: decision.side,
            risk_flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::candles;
    use crate::strategies::fakes::FakeWorld;
    use crate::types::Candle;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn confirm_buy_data() -> Vec<Candle> {
        candles(&[
            (dec!(98.95), dec!(99.7), dec!(98.9), dec!(99.6)),
            (dec!(99.5), dec!(99.6), dec!(98.9), dec!(99.0)),
            (dec!(99.3), dec!(99.5), dec!(99.2), dec!(99.4)),
        ])
    }

    fn trigger(positions: serde_json::Value, side: Option<&str>) -> serde_json::Value {
        json!({
            "correlation_id": "01JVWS6123454K4284GCHABRS8",
            "provider": "coinbase",
            "product": {"product_id": "BTC-USD", "base_increment": "0.00000001"},
            "portfolio": {"uuid": "portfolio-1"},
            "positions": positions,
            "strategy_term": "MEDIUM_TERM",
            "side": side,
            "config": {"profit_target": "5.0", "buy": "market_market_ioc", "toggle": true},
            "risk_flags": ["assets_PORTFOLIO_LOW"]
        })
    }

    fn losing_position() -> serde_json::Value {
        json!({
            "position_id": "01JVWS6XYJS19MECX98765VXJ",
            "product_id": "BTC-USD",
            "side": "BUY",
            "filled_size": "0.00187398",
            "average_filled_price": "111095.09",
            "order_id": "c3d3d39e-6697-496b-9d8e-10131dd12345"
        })
    }

    fn engine(world: &FakeWorld) -> StrategyEngine {
        StrategyEngine::new(EngineSettings::default(), world.collaborators())
    }

    #[tokio::test]
    async fn test_publishes_decision_to_risk_queue() {
        let world = FakeWorld::new(confirm_buy_data());
        let raw = trigger(json!([losing_position()]), None).to_string();

        let outcome = engine(&world).handle_event(&raw).await.unwrap();
        assert_eq!(
            outcome,
            HandleOutcome::Published {
                correlation_id: "01JVWS6123454K4284GCHABRS8".to_string(),
                side: Side::Buy,
                risk_flags: vec![
                    "assets_PORTFOLIO_LOW".to_string(),
                    "strategy_ORDER_SIDE_MED".to_string(),
                    "strategy_STRATEGY_RUN_LOW".to_string(),
                ],
            }
        );

        let published = world.published();
        assert_eq!(published.len(), 1);
        let msg = &published[0];
        assert_eq!(msg.destination, Destination::Risk);
        assert_eq!(msg.body["side"], "BUY");
        assert_eq!(msg.body["strategy_term"], "MEDIUM_TERM");
        assert_eq!(msg.body["product"]["base_increment"], "0.00000001");
        assert_eq!(msg.body["config"]["toggle"], true);
        assert_eq!(msg.body["positions"].as_array().unwrap().len(), 0);
        assert_eq!(msg.body["historical_data"].as_array().unwrap().len(), 3);
        assert_eq!(msg.body["assistant_event"], false);
    }

    #[tokio::test]
    async fn test_requested_buy_republishes_positions() {
        let world = FakeWorld::new(confirm_buy_data());
        let raw = trigger(json!([losing_position()]), Some("BUY")).to_string();

        engine(&world).handle_event(&raw).await.unwrap();

        let body = &world.published()[0].body;
        assert_eq!(body["positions"][0]["order_id"], "c3d3d39e-6697-496b-9d8e-10131dd12345");
        assert_eq!(body["positions"][0]["strategy_term"], "MEDIUM_TERM");
    }

    #[tokio::test]
    async fn test_sell_with_nothing_to_sell_completes_quietly() {
        let world = FakeWorld::new(confirm_buy_data());
        let raw = trigger(json!([losing_position()]), Some("SELL")).to_string();

        let outcome = engine(&world).handle_event(&raw).await.unwrap();
        assert!(matches!(outcome, HandleOutcome::NothingToSell { .. }));
        assert!(world.published().is_empty());
    }

    #[tokio::test]
    async fn test_queue_envelope_is_unwrapped() {
        let world = FakeWorld::new(confirm_buy_data());
        let body = trigger(json!([]), None).to_string();
        let raw = json!({"Records": [{"body": body}]}).to_string();

        let outcome = engine(&world).handle_event(&raw).await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Published { side: Side::Buy, .. }));
    }

    #[tokio::test]
    async fn test_empty_envelope_is_invalid() {
        let world = FakeWorld::new(confirm_buy_data());
        let err = engine(&world)
            .handle_event(r#"{"Records": []}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::InvalidEvent(_)));
    }

    #[tokio::test]
    async fn test_unknown_term_is_invalid_argument() {
        let world = FakeWorld::new(confirm_buy_data());
        let mut raw = trigger(json!([]), None);
        raw["strategy_term"] = json!("SCALPING");

        let err = engine(&world).handle_event(&raw.to_string()).await.unwrap_err();
        assert!(matches!(err, StrategyError::InvalidStrategyTerm(ref t) if t == "SCALPING"));
        assert!(world.candle_requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_correlation_id_is_generated() {
        let world = FakeWorld::new(confirm_buy_data());
        let mut raw = trigger(json!([]), None);
        raw.as_object_mut().unwrap().remove("correlation_id");
        raw["config"] = serde_json::Value::Null;

        let outcome = engine(&world).handle_event(&raw.to_string()).await.unwrap();
        let HandleOutcome::Published { correlation_id, .. } = outcome else {
            panic!("expected a published decision");
        };
        assert!(Uuid::parse_str(&correlation_id).is_ok());
        assert_eq!(world.candle_requests()[0].correlation_id, correlation_id);
    }

    #[test]
    fn test_wiring_from_empty_config() {
        assert!(StrategyEngine::from_config(&AppConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_product_config_is_rejected() {
        let world = FakeWorld::new(confirm_buy_data());
        let mut raw = trigger(json!([]), None);
        raw["config"] = json!({"profit_target": "-1"});

        let err = engine(&world).handle_event(&raw.to_string()).await.unwrap_err();
        assert!(matches!(err, StrategyError::InvalidConfig(_)));
    }
}
