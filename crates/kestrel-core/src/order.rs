//! Order model shared between the engine and broker gateways.
//!
//! Order status transitions are broker-owned: this side only observes
//! them, except for the optimistic status reported immediately after
//! submission.

use crate::{Price, Size, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Immediate execution at market price.
    Market,
    /// Protective sell below the market.
    StopLoss,
    /// Protective sell above the market.
    TakeProfit,
}

impl OrderKind {
    /// Whether this is a protective (risk) order.
    pub fn is_risk_order(&self) -> bool {
        matches!(self, Self::StopLoss | Self::TakeProfit)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// Broker-reported order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Unknown,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Broker-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a new unique order ID.
    ///
    /// Format: `ord_{timestamp_ms}_{uuid_short}`. Uniqueness matters for
    /// reconciliation: the monitor keys its last-seen map by this ID.
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("ord_{ts}_{uuid_short}"))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

/// A broker-side order as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub amount: Size,
    pub kind: OrderKind,
    /// None for market orders.
    pub price: Option<Price>,
    pub status: OrderStatus,
}

/// Parameters for submitting a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub amount: Size,
    pub kind: OrderKind,
    pub price: Option<Price>,
}

impl OrderRequest {
    /// Market order on the given side.
    pub fn market(symbol: Symbol, side: OrderSide, amount: Size) -> Self {
        Self {
            symbol,
            side,
            amount,
            kind: OrderKind::Market,
            price: None,
        }
    }

    /// Sell-side stop-loss at the given trigger price.
    pub fn stop_loss(symbol: Symbol, amount: Size, price: Price) -> Self {
        Self {
            symbol,
            side: OrderSide::Sell,
            amount,
            kind: OrderKind::StopLoss,
            price: Some(price),
        }
    }

    /// Sell-side take-profit at the given target price.
    pub fn take_profit(symbol: Symbol, amount: Size, price: Price) -> Self {
        Self {
            symbol,
            side: OrderSide::Sell,
            amount,
            kind: OrderKind::TakeProfit,
            price: Some(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_id_unique() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("ord_"));
    }

    #[test]
    fn test_risk_order_kinds() {
        assert!(OrderKind::StopLoss.is_risk_order());
        assert!(OrderKind::TakeProfit.is_risk_order());
        assert!(!OrderKind::Market.is_risk_order());
    }

    #[test]
    fn test_risk_requests_are_sell_side() {
        let symbol = Symbol::pair("BTC", "EUR");
        let sl = OrderRequest::stop_loss(symbol.clone(), Size::new(dec!(1)), Price::new(dec!(49000)));
        let tp = OrderRequest::take_profit(symbol, Size::new(dec!(1)), Price::new(dec!(52500)));
        assert_eq!(sl.side, OrderSide::Sell);
        assert_eq!(tp.side, OrderSide::Sell);
        assert_eq!(sl.kind, OrderKind::StopLoss);
        assert_eq!(tp.kind, OrderKind::TakeProfit);
    }
}
