//! Trading signal produced by a strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete directional recommendation, produced fresh each cycle.
///
/// Stateless and never persisted. Strategies that cannot decide
/// (insufficient history, degenerate data) return `Hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hold() {
        assert_eq!(Signal::default(), Signal::Hold);
    }
}
