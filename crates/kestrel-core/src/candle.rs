//! OHLCV candle data.

use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Extract closing prices from a candle series.
pub fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close.inner()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_closes_extraction() {
        let candles: Vec<Candle> = [dec!(100), dec!(101), dec!(102)]
            .iter()
            .map(|&c| {
                Candle::new(
                    Utc::now(),
                    Price::new(c),
                    Price::new(c),
                    Price::new(c),
                    Price::new(c),
                    dec!(10),
                )
            })
            .collect();
        assert_eq!(closes(&candles), vec![dec!(100), dec!(101), dec!(102)]);
    }
}
