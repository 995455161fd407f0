//! Open position record and the per-instrument ledger.

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use kestrel_core::{OrderId, Price, Size, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which protective leg an order id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLeg {
    StopLoss,
    TakeProfit,
}

/// The bot's record of a held quantity plus its protective order
/// references.
///
/// Created only when an entry order reports filled. Mutated by the risk
/// manager (trailing-stop updates, risk-order repair) and the order
/// monitor (clearing references on fill/cancel). Removed when a closing
/// order fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Quantity held; positive while the position is open.
    pub amount: Size,
    /// Fill price of the opening order.
    pub entry_price: Price,
    /// Current protective levels. For a long position,
    /// `stop_loss < entry_price < take_profit`.
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    /// Broker-side protective order references. Absent means not yet
    /// placed, or already filled/cancelled.
    pub sl_order_id: Option<OrderId>,
    pub tp_order_id: Option<OrderId>,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn new(symbol: Symbol, amount: Size, entry_price: Price) -> Self {
        Self {
            symbol,
            amount,
            entry_price,
            stop_loss: None,
            take_profit: None,
            sl_order_id: None,
            tp_order_id: None,
            opened_at: Utc::now(),
        }
    }

    /// Both protective orders are live at the broker.
    pub fn is_protected(&self) -> bool {
        self.sl_order_id.is_some() && self.tp_order_id.is_some()
    }

    /// Which risk leg the given order id belongs to, if any.
    pub fn risk_leg(&self, id: &OrderId) -> Option<RiskLeg> {
        if self.sl_order_id.as_ref() == Some(id) {
            Some(RiskLeg::StopLoss)
        } else if self.tp_order_id.as_ref() == Some(id) {
            Some(RiskLeg::TakeProfit)
        } else {
            None
        }
    }

    /// Drop the reference for a leg, making it eligible for re-placement.
    pub fn clear_risk_order(&mut self, leg: RiskLeg) {
        match leg {
            RiskLeg::StopLoss => self.sl_order_id = None,
            RiskLeg::TakeProfit => self.tp_order_id = None,
        }
    }
}

/// In-process record of open positions, at most one per instrument.
///
/// Accessed only from the single orchestrator task; no internal locking.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: HashMap<Symbol, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new position. Rejects a second position for the same
    /// symbol.
    pub fn open(&mut self, position: Position) -> LedgerResult<()> {
        if !position.amount.is_positive() {
            return Err(LedgerError::InvalidPosition(format!(
                "non-positive amount {} for {}",
                position.amount, position.symbol
            )));
        }
        if self.positions.contains_key(&position.symbol) {
            return Err(LedgerError::PositionAlreadyOpen(position.symbol));
        }
        self.positions.insert(position.symbol.clone(), position);
        Ok(())
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Option<&mut Position> {
        self.positions.get_mut(symbol)
    }

    /// Remove and return the position for a symbol.
    pub fn close(&mut self, symbol: &Symbol) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.positions.keys().cloned().collect()
    }

    /// Which position references the given order id as a risk leg.
    pub fn find_by_risk_order(&self, id: &OrderId) -> Option<(Symbol, RiskLeg)> {
        self.positions
            .values()
            .find_map(|p| p.risk_leg(id).map(|leg| (p.symbol.clone(), leg)))
    }
}
