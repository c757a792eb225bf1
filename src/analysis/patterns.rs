// src/analysis/patterns.rs
use crate::types::Candle;

fn is_bullish(candle: &Candle) -> bool {
    candle.close > candle.open
}

fn is_bearish(candle: &Candle) -> bool {
    candle.close < candle.open
}

/// Walks a newest-first window from its oldest pair towards the newest one,
/// yielding `(previous, current)` in chronological order.
fn chronological_pairs(window: &[Candle]) -> impl Iterator<Item = (&Candle, &Candle)> {
    window.windows(2).rev().map(|pair| (&pair[1], &pair[0]))
}

/// A bearish candle followed by a bullish one whose body engulfs it.
pub fn detect_bullish_engulfing(window: &[Candle]) -> bool {
    chronological_pairs(window).any(|(prev, curr)| {
        is_bearish(prev)
            && is_bullish(curr)
            && curr.close > prev.open
            && curr.open < prev.close
    })
}

/// A bullish candle followed by a bearish one whose body engulfs it.
pub fn detect_bearish_engulfing(window: &[Candle]) -> bool {
    chronological_pairs(window).any(|(prev, curr)| {
        is_bullish(prev)
            && is_bearish(curr)
            && curr.open > prev.close
            && curr.close < prev.open
    })
}
