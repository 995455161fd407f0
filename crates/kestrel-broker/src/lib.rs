//! Broker gateway abstraction for the Kestrel trading bot.
//!
//! The engine consumes brokers through the [`Broker`] capability trait;
//! concrete implementations are selected by configuration at construction
//! time via [`connect`]. Only the paper (simulated) broker ships here;
//! live exchange gateways plug in behind the same trait.

pub mod error;
pub mod gateway;
pub mod paper;

pub use error::{BrokerError, BrokerResult};
pub use gateway::{BoxFuture, Broker, BrokerPosition, DynBroker};
pub use paper::{PaperBroker, PaperBrokerConfig};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Broker selection. Variants are chosen in configuration, never by
/// runtime name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// In-process simulated exchange.
    #[default]
    Paper,
}

/// Broker configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub kind: BrokerKind,
    /// Paper broker parameters (ignored by live gateways).
    #[serde(default)]
    pub paper: PaperBrokerConfig,
}

/// Construct the configured broker.
pub fn connect(config: &BrokerConfig) -> BrokerResult<DynBroker> {
    match config.kind {
        BrokerKind::Paper => Ok(Arc::new(PaperBroker::new(config.paper.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_paper() {
        let broker = connect(&BrokerConfig::default()).unwrap();
        assert!(broker.is_connected());
        assert_eq!(broker.name(), "paper");
    }
}
