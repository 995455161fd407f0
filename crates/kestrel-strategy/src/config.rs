//! Strategy selection and construction.
//!
//! The concrete strategy is chosen in configuration and built once at
//! startup; there is no runtime name lookup.

use crate::{MaCrossover, RsiStrategy, SignalSource, TrendFollowing};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid strategy parameters: {0}")]
    InvalidParameters(String),
}

/// Strategy configuration, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    MaCrossover {
        #[serde(default = "default_fast_period")]
        fast_period: usize,
        #[serde(default = "default_slow_period")]
        slow_period: usize,
        #[serde(default = "default_signal_threshold")]
        signal_threshold: Decimal,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: Decimal,
        #[serde(default = "default_overbought")]
        overbought: Decimal,
    },
    TrendFollowing {
        #[serde(default = "default_ema_period")]
        ema_period: usize,
        #[serde(default = "default_trend_threshold")]
        trend_threshold: Decimal,
    },
}

fn default_fast_period() -> usize {
    10
}

fn default_slow_period() -> usize {
    30
}

fn default_signal_threshold() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_rsi_period() -> usize {
    14
}

fn default_oversold() -> Decimal {
    Decimal::from(30)
}

fn default_overbought() -> Decimal {
    Decimal::from(70)
}

fn default_ema_period() -> usize {
    50
}

fn default_trend_threshold() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::MaCrossover {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            signal_threshold: default_signal_threshold(),
        }
    }
}

impl StrategyConfig {
    /// Minimum candle history the strategy needs to produce a decision.
    pub fn required_history(&self) -> usize {
        match self {
            Self::MaCrossover { slow_period, .. } => slow_period + 1,
            Self::Rsi { period, .. } => period + 1,
            Self::TrendFollowing { ema_period, .. } => *ema_period,
        }
    }

    /// Validate parameters and build the strategy.
    pub fn build(&self) -> Result<Box<dyn SignalSource>, StrategyError> {
        match self {
            Self::MaCrossover {
                fast_period,
                slow_period,
                signal_threshold,
            } => {
                if *fast_period == 0 || *slow_period == 0 {
                    return Err(StrategyError::InvalidParameters(
                        "MA periods must be positive".to_string(),
                    ));
                }
                if fast_period >= slow_period {
                    return Err(StrategyError::InvalidParameters(format!(
                        "fast period {fast_period} must be below slow period {slow_period}"
                    )));
                }
                Ok(Box::new(MaCrossover::new(
                    *fast_period,
                    *slow_period,
                    *signal_threshold,
                )))
            }
            Self::Rsi {
                period,
                oversold,
                overbought,
            } => {
                if *period == 0 {
                    return Err(StrategyError::InvalidParameters(
                        "RSI period must be positive".to_string(),
                    ));
                }
                if oversold >= overbought {
                    return Err(StrategyError::InvalidParameters(format!(
                        "oversold {oversold} must be below overbought {overbought}"
                    )));
                }
                Ok(Box::new(RsiStrategy::new(*period, *oversold, *overbought)))
            }
            Self::TrendFollowing {
                ema_period,
                trend_threshold,
            } => {
                if *ema_period == 0 {
                    return Err(StrategyError::InvalidParameters(
                        "EMA period must be positive".to_string(),
                    ));
                }
                Ok(Box::new(TrendFollowing::new(*ema_period, *trend_threshold)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builds() {
        let config = StrategyConfig::default();
        let strategy = config.build().unwrap();
        assert_eq!(strategy.name(), "ma_crossover");
        assert_eq!(config.required_history(), 31);
    }

    #[test]
    fn test_inverted_ma_periods_rejected() {
        let config = StrategyConfig::MaCrossover {
            fast_period: 30,
            slow_period: 10,
            signal_threshold: Decimal::ZERO,
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_str = "kind = \"rsi\"\nperiod = 7\noversold = 25\noverbought = 75\n";
        let config: StrategyConfig = toml::from_str(toml_str).unwrap();
        let strategy = config.build().unwrap();
        assert_eq!(strategy.name(), "rsi");
    }
}
