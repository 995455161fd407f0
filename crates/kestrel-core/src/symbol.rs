//! Instrument identifier.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading pair symbol, e.g. "BTC/EUR".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from base and quote currencies.
    pub fn pair(base: &str, quote: &str) -> Self {
        Self(format!("{base}/{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_format() {
        let sym = Symbol::pair("BTC", "EUR");
        assert_eq!(sym.as_str(), "BTC/EUR");
    }

    #[test]
    fn test_empty_symbol_rejected() {
        assert!("".parse::<Symbol>().is_err());
        assert!("BTC/EUR".parse::<Symbol>().is_ok());
    }
}
