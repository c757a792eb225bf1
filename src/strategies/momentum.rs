// src/strategies/momentum.rs
use crate::analysis::levels::{support_resistance, Levels};
use crate::analysis::patterns::{detect_bearish_engulfing, detect_bullish_engulfing};
use crate::analysis::price_diff::{check_price_diff, PriceDiffCheck};
use crate::config::StrategyParams;
use crate::connectors::messages::{
    CandleRequest, DataCollectionMessage, Destination, IndicatorRequest, OutboundMessage,
};
use crate::errors::{Result, StrategyError};
use crate::strategies::traits::Strategy;
use crate::strategies::Collaborators;
use crate::types::{
    Candle, Decision, Position, RiskFlag, RiskLevel, RiskSource, Side, StrategyTerm,
};
use crate::utils::decimal::{pct_change, relative_distance};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Money view of a held position at the latest close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitSnapshot {
    pub current_price: Decimal,
    pub current_amt: Decimal,
    pub bought_amt: Decimal,
    pub profit_amt: Decimal,
    pub profit_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitCheck {
    /// Profit is beyond the target band.
    Sellable(ProfitSnapshot),
    /// Inside the band just below target. The assistant has been notified.
    NearTarget(ProfitSnapshot),
    /// At or below the minimum. Nobody is notified.
    BelowMinimum(ProfitSnapshot),
}

impl ProfitCheck {
    pub fn is_sellable(&self) -> bool {
        matches!(self, ProfitCheck::Sellable(_))
    }

    pub fn snapshot(&self) -> &ProfitSnapshot {
        match self {
            ProfitCheck::Sellable(s)
            | ProfitCheck::NearTarget(s)
            | ProfitCheck::BelowMinimum(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SideSelection {
    Selected {
        side: Side,
        positions: Vec<Position>,
        risk: RiskFlag,
    },
    /// A sell was requested but no position is worth selling.
    NoSellablePositions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendDiagnostics {
    pub side: Side,
    pub levels: Levels,
    pub latest_close: Decimal,
    pub bullish: bool,
    pub bearish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendConfirmation {
    Confirmed,
    Rejected(TrendDiagnostics),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Decided(Decision),
    NoSellablePositions,
}

fn order_side_risk(level: RiskLevel) -> RiskFlag {
    RiskFlag::new(RiskSource::OrderSide, level)
}

fn latest_close(data: &[Candle]) -> Result<Decimal> {
    data.first()
        .map(|c| c.close)
        .ok_or(StrategyError::InsufficientData { needed: 1, got: 0 })
}

/// Buy/sell/hold evaluator for one product over recent candles.
///
/// Holds nothing that changes between runs: the same inputs and collaborator
/// responses always give the same decision.
pub struct MomentumStrategy {
    params: StrategyParams,
    positions: Vec<Position>,
    collaborators: Collaborators,
}

impl MomentumStrategy {
    pub fn new(
        params: StrategyParams,
        positions: Vec<Position>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            params,
            positions,
            collaborators,
        }
    }

    fn term(&self) -> StrategyTerm {
        self.params.context.term
    }

    pub fn check_price_diff(&self, data: &[Candle]) -> Result<PriceDiffCheck> {
        check_price_diff(data, self.term(), &self.params.settings.price_diff_bands)
    }

    /// Fails with `BuyRejected` when the window moved into the banned band.
    pub fn analyze_buy(&self, data: &[Candle]) -> Result<()> {
        let check = self.check_price_diff(data)?;
        if !check.passed {
            warn!(
                operation = "ANALYZE_BUY_DATA",
                diff_pct = %check.diff_pct,
                "Max min diff pct check failed"
            );
            return Err(StrategyError::BuyRejected {
                diff_pct: check.diff_pct,
            });
        }
        Ok(())
    }

    fn near_target_message(
        &self,
        snapshot: &ProfitSnapshot,
        size: Decimal,
        buy_price: Decimal,
        position_id: &str,
    ) -> String {
        let ctx = &self.params.context;
        format!(
            "```***NEAR_PROFIT_TARGET_ALERT***\n\
             Provider: {provider}\n\
             Product: {product}\n\
             Strategy: {term}\n\
             Profit %: {pct}\n\
             Size: {size}\n\
             CurrentPrice: {current}\n\
             BoughtPrice: {bought}\n\
             Profit($): {profit}\n\
             CurrentValue: {current_amt}\n\
             BoughtValue: {bought_amt}\n\
             PositionID: {position_id}\n\
             ```",
            provider = ctx.provider,
            product = ctx.product_id,
            term = ctx.term,
            pct = snapshot.profit_pct.round_dp(4),
            size = size,
            current = snapshot.current_price,
            bought = buy_price,
            profit = snapshot.profit_amt.round_dp(2),
            current_amt = snapshot.current_amt.round_dp(2),
            bought_amt = snapshot.bought_amt.round_dp(2),
            position_id = position_id,
        )
    }

    /// Classifies a holding against the profit target band
    /// `[profit_target_min, profit_target]`.
    pub async fn check_profit(
        &self,
        data: &[Candle],
        size: Decimal,
        buy_price: Decimal,
        position_id: &str,
    ) -> Result<ProfitCheck> {
        let overflow = || StrategyError::Overflow("position profit");
        let current_price = latest_close(data)?;
        let current_amt = current_price.checked_mul(size).ok_or_else(overflow)?;
        let bought_amt = buy_price.checked_mul(size).ok_or_else(overflow)?;
        if bought_amt.is_zero() {
            return Err(StrategyError::InvalidPosition {
                position_id: position_id.to_string(),
            });
        }
        let profit_pct = pct_change(bought_amt, current_amt).ok_or_else(overflow)?;

        let snapshot = ProfitSnapshot {
            current_price,
            current_amt,
            bought_amt,
            profit_amt: current_amt.checked_sub(bought_amt).ok_or_else(overflow)?,
            profit_pct,
        };

        let target_min = self.params.settings.profit_target_min;
        let target_max = self.params.config.profit_target;

        if target_min <= profit_pct && profit_pct <= target_max {
            let message = self.near_target_message(&snapshot, size, buy_price, position_id);
            self.collaborators
                .notifier
                .notify(&self.params.context.correlation_id, &message)
                .await?;
            return Ok(ProfitCheck::NearTarget(snapshot));
        }
        if profit_pct <= target_min {
            return Ok(ProfitCheck::BelowMinimum(snapshot));
        }
        Ok(ProfitCheck::Sellable(snapshot))
    }

    /// Held positions worth selling at the latest close, in input order.
    pub async fn review_positions(&self, data: &[Candle]) -> Result<Vec<Position>> {
        if self.positions.is_empty() {
            warn!(operation = "REVIEW_POSITIONS", "No positions found");
            return Ok(Vec::new());
        }

        let mut sellable = Vec::new();
        for position in &self.positions {
            let check = self
                .check_profit(
                    data,
                    position.filled_size,
                    position.average_filled_price,
                    &position.position_id,
                )
                .await
                .map_err(|e| {
                    error!(
                        operation = "REVIEW_POSITIONS",
                        position_id = %position.position_id,
                        error = %e,
                        "Error analyzing sell prices"
                    );
                    e
                })?;

            if check.is_sellable() {
                sellable.push(position.clone());
            } else {
                let snapshot = check.snapshot();
                warn!(
                    operation = "REVIEW_POSITIONS",
                    position_id = %position.position_id,
                    profit_pct = %snapshot.profit_pct,
                    profit_amt = %snapshot.profit_amt,
                    current_amt = %snapshot.current_amt,
                    bought_amt = %snapshot.bought_amt,
                    near_target = matches!(check, ProfitCheck::NearTarget(_)),
                    "Price is too low to sell profit"
                );
            }
        }

        Ok(sellable)
    }

    /// Picks the order side for this run and its risk label.
    pub async fn select_side(
        &self,
        data: &[Candle],
        requested: Option<Side>,
    ) -> Result<SideSelection> {
        match self.term() {
            StrategyTerm::ShortTerm => Ok(SideSelection::Selected {
                side: Side::Buy,
                positions: Vec::new(),
                risk: order_side_risk(RiskLevel::High),
            }),
            StrategyTerm::MediumTerm => match requested {
                Some(Side::Buy) => {
                    self.analyze_buy(data)?;
                    Ok(SideSelection::Selected {
                        side: Side::Buy,
                        positions: self.positions.clone(),
                        risk: order_side_risk(RiskLevel::Med),
                    })
                }
                Some(Side::Sell) => {
                    let positions = self.review_positions(data).await?;
                    if positions.is_empty() {
                        warn!(operation = "ORDER_SIDE", "Sell requested but no positions to sell");
                        return Ok(SideSelection::NoSellablePositions);
                    }
                    Ok(SideSelection::Selected {
                        side: Side::Sell,
                        positions,
                        risk: order_side_risk(RiskLevel::Med),
                    })
                }
                None => {
                    let positions = self.review_positions(data).await?;
                    if !positions.is_empty() {
                        return Ok(SideSelection::Selected {
                            side: Side::Sell,
                            positions,
                            risk: order_side_risk(RiskLevel::Low),
                        });
                    }
                    self.analyze_buy(data)?;
                    Ok(SideSelection::Selected {
                        side: Side::Buy,
                        positions: Vec::new(),
                        risk: order_side_risk(RiskLevel::Med),
                    })
                }
            },
            StrategyTerm::LongTerm => Err(StrategyError::UnsupportedTerm {
                term: StrategyTerm::LongTerm.as_str(),
                operation: "order side selection",
            }),
        }
    }

    /// Confirms a BUY near support after a bullish engulfing, or a SELL near
    /// resistance after a bearish engulfing, within the recent pattern scope.
    pub fn confirm_trend(&self, data: &[Candle], side: Side) -> Result<TrendConfirmation> {
        let settings = &self.params.settings;
        let latest_close = latest_close(data)?;
        let levels = support_resistance(data, settings.support_resistance_tolerance)?;

        let scope = &data[..data.len().min(settings.candle_stick_scope)];
        let bullish = detect_bullish_engulfing(scope);
        let bearish = detect_bearish_engulfing(scope);

        let near = |level: Option<Decimal>| {
            level
                .and_then(|level| relative_distance(level, latest_close))
                .map_or(false, |distance| distance < settings.trend_threshold)
        };

        let confirmed = match side {
            Side::Buy => bullish && near(levels.support),
            Side::Sell => bearish && near(levels.resistance),
        };
        if confirmed {
            return Ok(TrendConfirmation::Confirmed);
        }

        let diagnostics = TrendDiagnostics {
            side,
            levels,
            latest_close,
            bullish,
            bearish,
        };
        warn!(
            operation = "CONFIRM_SIDE_WITH_TREND",
            side = %side,
            support = ?levels.support,
            resistance = ?levels.resistance,
            latest_close = %latest_close,
            bullish,
            bearish,
            "Trend confirmation failed"
        );
        Ok(TrendConfirmation::Rejected(diagnostics))
    }

    async fn fetch_history(&self) -> Result<Vec<Candle>> {
        let ctx = &self.params.context;
        let window = self
            .params
            .settings
            .window(ctx.term)
            .ok_or(StrategyError::UnsupportedTerm {
                term: ctx.term.as_str(),
                operation: "historical data retrieval",
            })?;

        let end = Utc::now();
        let start = end - Duration::hours(window.lookback_hours);
        let request = CandleRequest {
            correlation_id: ctx.correlation_id.clone(),
            product_id: ctx.product_id.clone(),
            start: start.timestamp(),
            end: end.timestamp(),
            granularity: window.granularity.clone(),
        };

        let candles = self
            .collaborators
            .market_data
            .get_candles(&request)
            .await
            .map_err(|e| {
                error!(operation = "HANDLE_HISTORICAL_DATA", error = %e, "Get candles failed");
                e
            })?;

        if ctx.term == StrategyTerm::ShortTerm {
            self.publish_for_collection(&candles).await?;
        }

        if candles.is_empty() {
            return Err(StrategyError::InsufficientData { needed: 1, got: 0 });
        }
        Ok(candles)
    }

    async fn publish_for_collection(&self, candles: &[Candle]) -> Result<()> {
        let ctx = &self.params.context;
        let body = serde_json::to_value(DataCollectionMessage {
            data_collection_type: "CANDLE_STICK",
            candle_stick_data: candles,
        })?;
        let attributes = BTreeMap::from([
            ("provider".to_string(), ctx.provider.clone()),
            ("product_id".to_string(), ctx.product_id.clone()),
            ("correlation_id".to_string(), ctx.correlation_id.clone()),
        ]);

        self.collaborators
            .publisher
            .publish(OutboundMessage {
                destination: Destination::DataCollection,
                body,
                attributes,
            })
            .await
    }

    async fn indicator_signals(&self, data: &[Candle]) -> Result<Vec<String>> {
        let ctx = &self.params.context;
        let settings = &self.params.settings;
        let request = IndicatorRequest {
            historical_data: data.to_vec(),
            product_id: ctx.product_id.clone(),
            provider: ctx.provider.clone(),
            n1: settings.sma_fast,
            n2: settings.sma_slow,
            strategy_term: ctx.term.as_str().to_string(),
            correlation_id: ctx.correlation_id.clone(),
            indicators: settings.indicators.clone(),
            candle_stick_scope: settings.candle_stick_scope,
            support_resistance_tolerance: settings.support_resistance_tolerance,
        };

        let response = self.collaborators.indicators.compute(&request).await?;
        if !response.is_success() {
            let reason = response
                .error
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(
                operation = "TA_INDICATORS",
                status = %response.status,
                error = %reason,
                "Error calculating technical indicators"
            );
            return Err(StrategyError::IndicatorCompute(reason));
        }
        Ok(response.signals)
    }

    async fn run_inner(&self, requested: Option<Side>) -> Result<RunOutcome> {
        let historical_data = self.fetch_history().await?;

        let signals = self.indicator_signals(&historical_data).await?;
        debug!(signals = ?signals, "Technical indicator signals");

        let (side, positions, risk) = match self.select_side(&historical_data, requested).await {
            Ok(SideSelection::Selected {
                side,
                positions,
                risk,
            }) => (side, positions, risk),
            Ok(SideSelection::NoSellablePositions) => return Ok(RunOutcome::NoSellablePositions),
            Err(e) => {
                error!(
                    operation = "ORDER_SIDE",
                    error = %e,
                    side = ?requested,
                    "Order side selection failed"
                );
                return Err(e);
            }
        };

        let mut risk_flags = vec![risk];
        let trend_level = match self.confirm_trend(&historical_data, side)? {
            TrendConfirmation::Confirmed => RiskLevel::Low,
            TrendConfirmation::Rejected(_) => RiskLevel::High,
        };
        risk_flags.push(RiskFlag::new(RiskSource::StrategyRun, trend_level));

        info!(side = %side, positions = positions.len(), "Strategy decided");
        Ok(RunOutcome::Decided(Decision {
            side,
            historical_data,
            positions,
            risk_flags,
        }))
    }
}

#[async_trait]
impl Strategy for MomentumStrategy {
    fn name(&self) -> String {
        format!("momentum/{}", self.term())
    }

    async fn run(&self, side: Option<Side>) -> Result<RunOutcome> {
        let ctx = &self.params.context;
        let span = info_span!(
            "strategy_run",
            correlation_id = %ctx.correlation_id,
            product_id = %ctx.product_id,
            provider = %ctx.provider,
            strategy_term = %ctx.term,
        );
        self.run_inner(side).instrument(span).await
    }
}
