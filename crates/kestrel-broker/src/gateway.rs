//! Broker capability trait.
//!
//! Dyn-compatible async surface via boxed futures, so the engine can hold
//! an `Arc<dyn Broker>` and swap implementations (paper, live) without
//! generic plumbing through every component.

use crate::error::BrokerResult;
use kestrel_core::{Candle, Order, OrderId, OrderRequest, OrderStatus, Price, Size, Symbol};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A holding as reported by the broker, independent of the engine's ledger.
///
/// Used at startup to detect exposure drift between the broker account and
/// the locally tracked positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: Symbol,
    pub amount: Size,
}

/// Capability set the engine requires from any broker gateway.
///
/// Transport, authentication, rate limiting, and per-call timeouts are the
/// implementation's responsibility; the engine treats any failure here as a
/// recoverable cycle error.
pub trait Broker: Send + Sync {
    /// Gateway name for logs.
    fn name(&self) -> &str;

    /// Current connection flag. Cheap, non-blocking.
    fn is_connected(&self) -> bool;

    /// Attempt to re-establish the connection.
    fn reconnect(&self) -> BoxFuture<'_, BrokerResult<()>>;

    /// Broker-reported holdings.
    fn positions(&self) -> BoxFuture<'_, BrokerResult<Vec<BrokerPosition>>>;

    /// All orders currently open at the broker.
    fn open_orders(&self) -> BoxFuture<'_, BrokerResult<Vec<Order>>>;

    /// Current status of a single order. Unknown ids report
    /// `OrderStatus::Unknown` rather than an error.
    fn order_status(&self, id: OrderId) -> BoxFuture<'_, BrokerResult<OrderStatus>>;

    /// Latest traded price for the instrument.
    fn current_price(&self, symbol: Symbol) -> BoxFuture<'_, BrokerResult<Price>>;

    /// Recent candle history, oldest first.
    fn candles(&self, symbol: Symbol, limit: usize) -> BoxFuture<'_, BrokerResult<Vec<Candle>>>;

    /// Submit an order. The returned order carries at least `id` and
    /// `status`; market orders report `Filled` when the exchange fills
    /// synchronously.
    fn place_order(&self, request: OrderRequest) -> BoxFuture<'_, BrokerResult<Order>>;

    /// Cancel an open order. Returns false if the order was not open.
    fn cancel_order(&self, id: OrderId) -> BoxFuture<'_, BrokerResult<bool>>;
}

/// Shared broker handle.
pub type DynBroker = Arc<dyn Broker>;
