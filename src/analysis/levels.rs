// src/analysis/levels.rs
use crate::errors::{Result, StrategyError};
use crate::types::Candle;
use crate::utils::decimal::{mean, relative_distance};
use rust_decimal::Decimal;

/// Support and resistance price levels estimated from a candle window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Levels {
    pub support: Option<Decimal>,
    pub resistance: Option<Decimal>,
}

/// Support is the mean of every low that sits within `tolerance` of all
/// other lows; resistance is the same over highs. A single outlier in the
/// window leaves that side without a level.
pub fn support_resistance(candles: &[Candle], tolerance: Decimal) -> Result<Levels> {
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();

    Ok(Levels {
        support: cluster_level(&lows, tolerance)?,
        resistance: cluster_level(&highs, tolerance)?,
    })
}

fn cluster_level(values: &[Decimal], tolerance: Decimal) -> Result<Option<Decimal>> {
    let clustered: Vec<Decimal> = values
        .iter()
        .copied()
        .filter(|&candidate| {
            values.iter().all(|&other| {
                relative_distance(candidate, other).map_or(false, |d| d <= tolerance)
            })
        })
        .collect();

    if clustered.is_empty() {
        return Ok(None);
    }
    mean(&clustered)
        .map(Some)
        .ok_or(StrategyError::Overflow("support/resistance level"))
}
