// src/analysis/price_diff.rs
use crate::errors::{Result, StrategyError};
use crate::types::{Candle, StrategyTerm};
use crate::utils::decimal::pct_change;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Closed range of price change percentages in which buying is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PriceDiffBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceDiffBand {
    pub fn contains(&self, diff_pct: Decimal) -> bool {
        self.min <= diff_pct && diff_pct <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PriceDiffBands {
    pub short_term: PriceDiffBand,
    pub medium_term: PriceDiffBand,
}

impl Default for PriceDiffBands {
    fn default() -> Self {
        Self {
            // Single point band; kept as deployed.
            short_term: PriceDiffBand {
                min: Decimal::ONE,
                max: Decimal::ONE,
            },
            medium_term: PriceDiffBand {
                min: Decimal::from(-10),
                max: Decimal::from(-5),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDiffCheck {
    pub passed: bool,
    pub diff_pct: Decimal,
}

/// Percentage change between the oldest and the newest close of a
/// newest-first candle list. A zero oldest close yields zero.
pub fn price_diff_pct(candles: &[Candle]) -> Result<Decimal> {
    let (newest, oldest) = match (candles.first(), candles.last()) {
        (Some(newest), Some(oldest)) => (newest, oldest),
        _ => return Err(StrategyError::InsufficientData { needed: 1, got: 0 }),
    };
    if oldest.close.is_zero() {
        return Ok(Decimal::ZERO);
    }
    pct_change(oldest.close, newest.close).ok_or(StrategyError::Overflow("price diff"))
}

/// Rejects when the window's price change falls inside the term's banned band.
/// LONG_TERM is never rejected.
pub fn check_price_diff(
    candles: &[Candle],
    term: StrategyTerm,
    bands: &PriceDiffBands,
) -> Result<PriceDiffCheck> {
    let diff_pct = price_diff_pct(candles)?;

    let banned = match term {
        StrategyTerm::ShortTerm => bands.short_term.contains(diff_pct),
        StrategyTerm::MediumTerm => bands.medium_term.contains(diff_pct),
        StrategyTerm::LongTerm => false,
    };

    Ok(PriceDiffCheck {
        passed: !banned,
        diff_pct,
    })
}
