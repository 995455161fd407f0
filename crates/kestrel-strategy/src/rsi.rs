//! RSI threshold strategy.
//!
//! Oversold (RSI below the lower bound) buys, overbought (RSI above the
//! upper bound) sells.

use crate::indicators::rsi;
use crate::SignalSource;
use kestrel_core::{candle::closes, Candle, Signal};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub struct RsiStrategy {
    period: usize,
    oversold: Decimal,
    overbought: Decimal,
}

impl RsiStrategy {
    pub fn new(period: usize, oversold: Decimal, overbought: Decimal) -> Self {
        info!(period, %oversold, %overbought, "RSI strategy initialized");
        Self {
            period,
            oversold,
            overbought,
        }
    }
}

impl SignalSource for RsiStrategy {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn generate_signal(&mut self, candles: &[Candle]) -> Signal {
        let closes = closes(candles);
        let Some(current) = rsi(&closes, self.period) else {
            debug!(len = closes.len(), "Insufficient history for RSI");
            return Signal::Hold;
        };

        if current < self.oversold {
            info!(rsi = %current, "RSI oversold");
            Signal::Buy
        } else if current > self.overbought {
            info!(rsi = %current, "RSI overbought");
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kestrel_core::Price;
    use rust_decimal_macros::dec;

    fn candles_from(closes: &[Decimal]) -> Vec<Candle> {
        closes
            .iter()
            .map(|&c| {
                Candle::new(
                    Utc::now(),
                    Price::new(c),
                    Price::new(c),
                    Price::new(c),
                    Price::new(c),
                    dec!(1),
                )
            })
            .collect()
    }

    #[test]
    fn test_falling_series_buys() {
        let mut strategy = RsiStrategy::new(14, dec!(30), dec!(70));
        let closes: Vec<Decimal> = (1..=20).rev().map(Decimal::from).collect();
        assert_eq!(strategy.generate_signal(&candles_from(&closes)), Signal::Buy);
    }

    #[test]
    fn test_rising_series_sells() {
        let mut strategy = RsiStrategy::new(14, dec!(30), dec!(70));
        let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        assert_eq!(
            strategy.generate_signal(&candles_from(&closes)),
            Signal::Sell
        );
    }

    #[test]
    fn test_insufficient_history_holds() {
        let mut strategy = RsiStrategy::new(14, dec!(30), dec!(70));
        let closes: Vec<Decimal> = (1..=10).map(Decimal::from).collect();
        assert_eq!(
            strategy.generate_signal(&candles_from(&closes)),
            Signal::Hold
        );
    }
}
