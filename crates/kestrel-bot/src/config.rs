//! Application configuration.
//!
//! Loaded once at startup from a TOML file and passed by reference into
//! each component constructor. There is no global configuration state.

use crate::error::{EngineError, EngineResult};
use kestrel_backup::BackupConfig;
use kestrel_broker::BrokerConfig;
use kestrel_core::{Size, Symbol};
use kestrel_notify::NotifyConfig;
use kestrel_risk::RiskConfig;
use kestrel_strategy::StrategyConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trading parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Instrument to trade, e.g. "BTC/EUR".
    #[serde(default = "default_symbol")]
    pub symbol: Symbol,
    /// Quantity per entry order.
    #[serde(default = "default_trade_amount")]
    pub trade_amount: Size,
    /// Maximum concurrently open positions. Default: 1.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Seconds between cycle starts. Default: 60.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

fn default_symbol() -> Symbol {
    Symbol::pair("BTC", "EUR")
}

fn default_trade_amount() -> Size {
    Size::new(Decimal::new(1, 2)) // 0.01
}

fn default_max_positions() -> usize {
    1
}

fn default_check_interval_secs() -> u64 {
    60
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            trade_amount: default_trade_amount(),
            max_positions: default_max_positions(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub notifications: NotifyConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine must not start with.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.trading.trade_amount.is_positive() {
            return Err(EngineError::Config(format!(
                "trade_amount must be positive, got {}",
                self.trading.trade_amount
            )));
        }
        if self.trading.max_positions == 0 {
            return Err(EngineError::Config(
                "max_positions must be at least 1".to_string(),
            ));
        }
        if self.trading.check_interval_secs == 0 {
            return Err(EngineError::Config(
                "check_interval_secs must be at least 1".to_string(),
            ));
        }
        self.risk.validate().map_err(EngineError::Config)?;
        Ok(())
    }
}
