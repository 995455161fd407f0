//! Moving-average crossover strategy.
//!
//! Buy when the fast MA crosses above the slow MA, sell when it crosses
//! below. A crossover only counts when the separation clears the
//! configured threshold fraction of the slow MA.

use crate::indicators::sma;
use crate::SignalSource;
use kestrel_core::{candle::closes, Candle, Signal};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    signal_threshold: Decimal,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize, signal_threshold: Decimal) -> Self {
        info!(fast_period, slow_period, "MA crossover strategy initialized");
        Self {
            fast_period,
            slow_period,
            signal_threshold,
        }
    }
}

impl SignalSource for MaCrossover {
    fn name(&self) -> &'static str {
        "ma_crossover"
    }

    fn generate_signal(&mut self, candles: &[Candle]) -> Signal {
        let closes = closes(candles);
        // Need one extra candle for the previous-bar comparison.
        if closes.len() < self.slow_period + 1 {
            debug!(len = closes.len(), "Insufficient history for MA crossover");
            return Signal::Hold;
        }

        let prev = &closes[..closes.len() - 1];
        let (Some(cur_fast), Some(cur_slow), Some(prev_fast), Some(prev_slow)) = (
            sma(&closes, self.fast_period),
            sma(&closes, self.slow_period),
            sma(prev, self.fast_period),
            sma(prev, self.slow_period),
        ) else {
            return Signal::Hold;
        };

        if cur_slow.is_zero() {
            return Signal::Hold;
        }
        let separation = (cur_fast - cur_slow).abs() / cur_slow;

        if prev_fast <= prev_slow && cur_fast > cur_slow && separation >= self.signal_threshold {
            info!(%cur_fast, %cur_slow, "Bullish crossover detected");
            return Signal::Buy;
        }
        if prev_fast >= prev_slow && cur_fast < cur_slow && separation >= self.signal_threshold {
            info!(%cur_fast, %cur_slow, "Bearish crossover detected");
            return Signal::Sell;
        }
        Signal::Hold
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
    fn test_insufficient_history_holds() {
        let mut strategy = MaCrossover::new(2, 4, dec!(0.001));
        let candles = candles_from(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Hold);
    }

    #[test]
    fn test_bullish_crossover() {
        let mut strategy = MaCrossover::new(2, 4, dec!(0.001));
        // Flat then a sharp jump: fast MA crosses above slow MA on the last bar.
        let candles = candles_from(&[dec!(100), dec!(100), dec!(100), dec!(100), dec!(120)]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Buy);
    }

    #[test]
    fn test_bearish_crossover() {
        let mut strategy = MaCrossover::new(2, 4, dec!(0.001));
        let candles = candles_from(&[dec!(100), dec!(100), dec!(100), dec!(100), dec!(80)]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Sell);
    }

    #[test]
    fn test_crossover_below_threshold_holds() {
        // Threshold of 50% suppresses a modest crossover.
        let mut strategy = MaCrossover::new(2, 4, dec!(0.5));
        let candles = candles_from(&[dec!(100), dec!(100), dec!(100), dec!(100), dec!(120)]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Hold);
    }

    #[test]
    fn test_no_crossover_holds() {
        let mut strategy = MaCrossover::new(2, 4, dec!(0.001));
        let candles = candles_from(&[dec!(100), dec!(100), dec!(100), dec!(100), dec!(100)]);
        assert_eq!(strategy.generate_signal(&candles), Signal::Hold);
    }
}
