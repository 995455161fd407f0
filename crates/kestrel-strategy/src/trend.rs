//! EMA trend-following strategy.
//!
//! Buys when price runs above its EMA by more than the trend threshold,
//! sells when it runs below by the same margin.

use crate::indicators::ema;
use crate::SignalSource;
use kestrel_core::{candle::closes, Candle, Signal};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub struct TrendFollowing {
    ema_period: usize,
    trend_threshold: Decimal,
}

impl TrendFollowing {
    pub fn new(ema_period: usize, trend_threshold: Decimal) -> Self {
        info!(ema_period, "Trend following strategy initialized");
        Self {
            ema_period,
            trend_threshold,
        }
    }
}

impl SignalSource for TrendFollowing {
    fn name(&self) -> &'static str {
        "trend_following"
    }

    fn generate_signal(&mut self, candles: &[Candle]) -> Signal {
        let closes = closes(candles);
        let Some(ema) = ema(&closes, self.ema_period) else {
            debug!(len = closes.len(), "Insufficient history for trend EMA");
            return Signal::Hold;
        };
        if ema.is_zero() {
            return Signal::Hold;
        }

        let price = closes[closes.len() - 1];
        let deviation = (price - ema) / ema;

        if deviation > self.trend_threshold {
            info!(%deviation, "Uptrend detected");
            Signal::Buy
        } else if deviation < -self.trend_threshold {
            info!(%deviation, "Downtrend detected");
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
    fn test_price_spike_above_ema_buys() {
        let mut strategy = TrendFollowing::new(10, dec!(0.02));
        let mut closes = vec![dec!(100); 20];
        *closes.last_mut().unwrap() = dec!(110);
        assert_eq!(strategy.generate_signal(&candles_from(&closes)), Signal::Buy);
    }

    #[test]
    fn test_price_drop_below_ema_sells() {
        let mut strategy = TrendFollowing::new(10, dec!(0.02));
        let mut closes = vec![dec!(100); 20];
        *closes.last_mut().unwrap() = dec!(90);
        assert_eq!(
            strategy.generate_signal(&candles_from(&closes)),
            Signal::Sell
        );
    }

    #[test]
    fn test_flat_series_holds() {
        let mut strategy = TrendFollowing::new(10, dec!(0.02));
        let closes = vec![dec!(100); 20];
        assert_eq!(
            strategy.generate_signal(&candles_from(&closes)),
            Signal::Hold
        );
    }

    #[test]
    fn test_insufficient_history_holds() {
        let mut strategy = TrendFollowing::new(10, dec!(0.02));
        let closes = vec![dec!(100); 5];
        assert_eq!(
            strategy.generate_signal(&candles_from(&closes)),
            Signal::Hold
        );
    }
}
