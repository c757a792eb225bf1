pub mod levels;
pub mod patterns;
pub mod price_diff;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::Candle;
    use rust_decimal::Decimal;

    /// Newest-first candles from (open, high, low, close) tuples, one minute apart.
    pub fn candles(rows: &[(Decimal, Decimal, Decimal, Decimal)]) -> Vec<Candle> {
        let newest = 1_700_000_000i64;
        rows.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                open_time: newest - 60 * i as i64,
                close_time: Some(newest - 60 * i as i64 + 60),
                open,
                high,
                low,
                close,
                volume: Decimal::ONE,
            })
            .collect()
    }

    /// Newest-first candles where only the close matters.
    pub fn closes(values: &[Decimal]) -> Vec<Candle> {
        let rows: Vec<_> = values.iter().map(|&c| (c, c, c, c)).collect();
        candles(&rows)
    }

    /// Newest-first candles where only open and close matter.
    pub fn bodies(rows: &[(Decimal, Decimal)]) -> Vec<Candle> {
        let rows: Vec<_> = rows
            .iter()
            .map(|&(open, close)| (open, open.max(close), open.min(close), close))
            .collect();
        candles(&rows)
    }
}
