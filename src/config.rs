// src/config.rs

use crate::analysis::price_diff::PriceDiffBands;
use crate::errors::{Result, StrategyError};
use crate::types::StrategyTerm;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: String,
    pub timeout_secs: Option<u64>,
}

fn default_channel() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            access_token: String::new(),
            channel: default_channel(),
        }
    }
}

/// Remote indicator service. Without a url the in-process SMA service is used.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IndicatorsConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct QueueConfig {
    pub risk_url: String,
    pub data_collection_url: String,
}

fn default_filter() -> String {
    "momentum_strategy=info,warn".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for the daily rolling JSON log. Stdout only when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            filter: default_filter(),
        }
    }
}

/// Candle request window for one strategy term.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TermWindow {
    pub lookback_hours: i64,
    /// Provider granularity code.
    pub granularity: String,
}

/// Tunables of the decision engine. Defaults are the production values.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub short_term: TermWindow,
    pub medium_term: TermWindow,
    pub price_diff_bands: PriceDiffBands,
    pub profit_target_min: Decimal,
    pub trend_threshold: Decimal,
    pub candle_stick_scope: usize,
    pub support_resistance_tolerance: Decimal,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub indicators: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            short_term: TermWindow {
                lookback_hours: 5,
                granularity: "1".to_string(),
            },
            medium_term: TermWindow {
                lookback_hours: 24 * 5,
                granularity: "4".to_string(),
            },
            price_diff_bands: PriceDiffBands::default(),
            profit_target_min: Decimal::from(4),
            trend_threshold: Decimal::new(1, 2),
            candle_stick_scope: 12,
            support_resistance_tolerance: Decimal::new(5, 2),
            sma_fast: 14,
            sma_slow: 50,
            indicators: vec!["sma".to_string()],
        }
    }
}

impl EngineSettings {
    pub fn window(&self, term: StrategyTerm) -> Option<&TermWindow> {
        match term {
            StrategyTerm::ShortTerm => Some(&self.short_term),
            StrategyTerm::MediumTerm => Some(&self.medium_term),
            StrategyTerm::LongTerm => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub assistant: AssistantConfig,
    pub indicators: IndicatorsConfig,
    pub queues: QueueConfig,
    pub logging: LoggingConfig,
    pub strategy: EngineSettings,
}

impl AppConfig {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        Self::load("Settings")
    }

    /// Optional settings file, overridden by `APP_` environment variables
    /// (`APP_PROVIDER__BASE_URL`, `APP_STRATEGY__PROFIT_TARGET_MIN`, ...).
    pub fn load(settings_file: &str) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(settings_file).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

// --- Per-product strategy configuration (arrives with each trigger) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderConfigurationType {
    #[default]
    MarketMarketIoc,
    SorLimitIoc,
    LimitLimitGtc,
    LimitLimitGtd,
    LimitLimitFok,
    StopLimitStopLimitGtc,
    StopLimitStopLimitGtd,
    TriggerBracketGtc,
}

fn default_strategy_type() -> String {
    "momentum".to_string()
}

fn five() -> Decimal {
    Decimal::from(5)
}

fn default_maxmin_pct_threshold() -> Decimal {
    Decimal::new(15, 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_strategy_type")]
    pub strategy_type: String,
    #[serde(default = "five")]
    pub profit_target: Decimal,
    #[serde(default = "five")]
    pub config_quote_min_size: Decimal,
    #[serde(default = "five")]
    pub config_quote_max_size: Decimal,
    #[serde(default = "default_maxmin_pct_threshold")]
    pub maxmin_pct_threshold: Decimal,
    #[serde(default)]
    pub buy: OrderConfigurationType,
    #[serde(default)]
    pub sell: OrderConfigurationType,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy_type: default_strategy_type(),
            profit_target: five(),
            config_quote_min_size: five(),
            config_quote_max_size: five(),
            maxmin_pct_threshold: default_maxmin_pct_threshold(),
            buy: OrderConfigurationType::default(),
            sell: OrderConfigurationType::default(),
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.profit_target <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(format!(
                "profit_target must be positive, got {}",
                self.profit_target
            )));
        }
        if self.config_quote_min_size < Decimal::ZERO
            || self.config_quote_min_size > self.config_quote_max_size
        {
            return Err(StrategyError::InvalidConfig(format!(
                "quote size range [{}, {}] is invalid",
                self.config_quote_min_size, self.config_quote_max_size
            )));
        }
        Ok(())
    }
}

/// Identity of one evaluation: who asked, for what product, on which horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyContext {
    pub correlation_id: String,
    pub provider: String,
    pub product_id: String,
    pub term: StrategyTerm,
}

impl StrategyContext {
    pub fn new(
        correlation_id: impl Into<String>,
        provider: impl Into<String>,
        product_id: impl Into<String>,
        term: StrategyTerm,
    ) -> Result<Self> {
        let context = Self {
            correlation_id: correlation_id.into(),
            provider: provider.into(),
            product_id: product_id.into(),
            term,
        };
        for (name, value) in [
            ("correlation_id", &context.correlation_id),
            ("provider", &context.provider),
            ("product_id", &context.product_id),
        ] {
            if value.trim().is_empty() {
                return Err(StrategyError::InvalidConfig(format!("{} is required", name)));
            }
        }
        Ok(context)
    }
}

/// Everything a strategy run needs to know, validated once at construction.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    pub context: StrategyContext,
    pub config: StrategyConfig,
    pub settings: EngineSettings,
}

impl StrategyParams {
    pub fn new(
        context: StrategyContext,
        config: StrategyConfig,
        settings: EngineSettings,
    ) -> Result<Self> {
        config.validate()?;
        if settings.candle_stick_scope < 2 {
            return Err(StrategyError::InvalidConfig(
                "candle_stick_scope must cover at least two candles".to_string(),
            ));
        }
        Ok(Self {
            context,
            config,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_engine_settings_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.profit_target_min, dec!(4));
        assert_eq!(settings.trend_threshold, dec!(0.01));
        assert_eq!(settings.support_resistance_tolerance, dec!(0.05));
        assert_eq!(settings.candle_stick_scope, 12);
        assert_eq!(settings.medium_term.lookback_hours, 120);
        assert!(settings.window(StrategyTerm::LongTerm).is_none());
    }

    #[test]
    fn test_settings_file_overrides_selected_fields() {
        let toml = r#"
            [provider]
            base_url = "https://provider.example"
            api_key = "key"

            [strategy]
            candle_stick_scope = 20

            [strategy.short_term]
            lookback_hours = 2
            granularity = "1"
        "#;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.provider.base_url, "https://provider.example");
        assert_eq!(config.strategy.candle_stick_scope, 20);
        assert_eq!(config.strategy.short_term.lookback_hours, 2);
        assert_eq!(config.strategy.sma_slow, 50);
        assert_eq!(config.assistant.channel, "general");
        assert_eq!(config.logging.filter, "momentum_strategy=info,warn");
    }

    #[test]
    fn test_strategy_config_defaults_and_parsing() {
        let config: StrategyConfig = serde_json::from_value(json!({
            "profit_target": "7.5",
            "sell": "limit_limit_gtc"
        }))
        .unwrap();

        assert_eq!(config.profit_target, dec!(7.5));
        assert_eq!(config.config_quote_min_size, dec!(5));
        assert_eq!(config.maxmin_pct_threshold, dec!(1.5));
        assert_eq!(config.buy, OrderConfigurationType::MarketMarketIoc);
        assert_eq!(config.sell, OrderConfigurationType::LimitLimitGtc);
        assert_eq!(config.strategy_type, "momentum");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_config_validation() {
        let config = StrategyConfig {
            profit_target: Decimal::ZERO,
            ..StrategyConfig::default()
        };
        assert!(matches!(config.validate(), Err(StrategyError::InvalidConfig(_))));

        let config = StrategyConfig {
            config_quote_min_size: dec!(10),
            config_quote_max_size: dec!(5),
            ..StrategyConfig::default()
        };
        assert!(matches!(config.validate(), Err(StrategyError::InvalidConfig(_))));
    }

    #[test]
    fn test_context_requires_identifiers() {
        assert!(StrategyContext::new("c1", "coinbase", "BTC-USD", StrategyTerm::ShortTerm).is_ok());
        let err = StrategyContext::new("c1", "", "BTC-USD", StrategyTerm::ShortTerm).unwrap_err();
        assert!(err.to_string().contains("provider"));
    }
}
