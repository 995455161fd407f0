//! In-process simulated exchange.
//!
//! Fills market orders synchronously at the simulated price and leaves
//! risk orders resting open. Prices follow a small random walk around the
//! configured base price. Tests and paper deployments drive fills and
//! outages through the `set_*`/`fill_open_order` knobs.

use crate::error::{BrokerError, BrokerResult};
use crate::gateway::{BoxFuture, Broker, BrokerPosition};
use chrono::{Duration, Utc};
use kestrel_core::{
    Candle, Order, OrderId, OrderKind, OrderRequest, OrderSide, OrderStatus, Price, Size, Symbol,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Paper broker parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperBrokerConfig {
    /// Starting price for the simulated instrument.
    pub base_price: Decimal,
    /// Maximum per-tick drift in basis points.
    pub drift_bps: i64,
    /// RNG seed. None seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            base_price: Decimal::from(50_000),
            drift_bps: 20,
            seed: None,
        }
    }
}

struct PaperState {
    orders: Vec<Order>,
    holdings: HashMap<Symbol, Size>,
    last_price: Decimal,
    rng: StdRng,
    drift_bps: i64,
    fail_submissions: u32,
    fail_cancels: u32,
}

impl PaperState {
    /// Advance the simulated price by one random-walk tick.
    fn tick_price(&mut self) -> Decimal {
        if self.drift_bps > 0 {
            let drift = self.rng.gen_range(-self.drift_bps..=self.drift_bps);
            self.last_price *= Decimal::ONE + Decimal::new(drift, 4);
        }
        self.last_price
    }

    fn apply_fill(&mut self, symbol: &Symbol, side: OrderSide, amount: Size) {
        let held = self
            .holdings
            .entry(symbol.clone())
            .or_insert(Size::ZERO);
        *held = match side {
            OrderSide::Buy => *held + amount,
            OrderSide::Sell => {
                if amount.inner() >= held.inner() {
                    Size::ZERO
                } else {
                    *held - amount
                }
            }
        };
        if held.is_zero() {
            self.holdings.remove(symbol);
        }
    }
}

/// Simulated broker for paper trading and tests.
pub struct PaperBroker {
    connected: AtomicBool,
    state: Mutex<PaperState>,
}

impl PaperBroker {
    pub fn new(config: PaperBrokerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(base_price = %config.base_price, "Paper broker initialized");
        Self {
            connected: AtomicBool::new(true),
            state: Mutex::new(PaperState {
                orders: Vec::new(),
                holdings: HashMap::new(),
                last_price: config.base_price,
                rng,
                drift_bps: config.drift_bps,
                fail_submissions: 0,
                fail_cancels: 0,
            }),
        }
    }

    /// Drop or restore the simulated connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Pin the simulated price to an exact value.
    pub fn set_price(&self, price: Decimal) {
        self.state.lock().last_price = price;
    }

    /// Fail the next `n` order submissions.
    pub fn fail_next_submissions(&self, n: u32) {
        self.state.lock().fail_submissions = n;
    }

    /// Fail the next `n` cancellations.
    pub fn fail_next_cancels(&self, n: u32) {
        self.state.lock().fail_cancels = n;
    }

    /// Mark a resting order as filled, applying its holdings effect.
    ///
    /// Returns false if the order is not currently open.
    pub fn fill_open_order(&self, id: &OrderId) -> bool {
        let mut state = self.state.lock();
        let Some(idx) = state.orders.iter().position(|o| &o.id == id) else {
            return false;
        };
        if state.orders[idx].status != OrderStatus::Open {
            return false;
        }
        state.orders[idx].status = OrderStatus::Filled;
        let (symbol, side, amount) = {
            let order = &state.orders[idx];
            (order.symbol.clone(), order.side, order.amount)
        };
        state.apply_fill(&symbol, side, amount);
        debug!(order_id = %id, "Paper order filled");
        true
    }

    fn ensure_connected(&self) -> BrokerResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BrokerError::Disconnected)
        }
    }
}

impl Broker for PaperBroker {
    fn name(&self) -> &str {
        "paper"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> BoxFuture<'_, BrokerResult<()>> {
        Box::pin(async move {
            self.connected.store(true, Ordering::SeqCst);
            info!("Paper broker reconnected");
            Ok(())
        })
    }

    fn positions(&self) -> BoxFuture<'_, BrokerResult<Vec<BrokerPosition>>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let state = self.state.lock();
            Ok(state
                .holdings
                .iter()
                .map(|(symbol, amount)| BrokerPosition {
                    symbol: symbol.clone(),
                    amount: *amount,
                })
                .collect())
        })
    }

    fn open_orders(&self) -> BoxFuture<'_, BrokerResult<Vec<Order>>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let state = self.state.lock();
            Ok(state
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Open)
                .cloned()
                .collect())
        })
    }

    fn order_status(&self, id: OrderId) -> BoxFuture<'_, BrokerResult<OrderStatus>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let state = self.state.lock();
            Ok(state
                .orders
                .iter()
                .find(|o| o.id == id)
                .map(|o| o.status)
                .unwrap_or(OrderStatus::Unknown))
        })
    }

    fn current_price(&self, _symbol: Symbol) -> BoxFuture<'_, BrokerResult<Price>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let mut state = self.state.lock();
            Ok(Price::new(state.tick_price()))
        })
    }

    fn candles(&self, _symbol: Symbol, limit: usize) -> BoxFuture<'_, BrokerResult<Vec<Candle>>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let mut state = self.state.lock();
            let now = Utc::now();
            let mut candles = Vec::with_capacity(limit);
            let mut prev_close = state.last_price;
            for i in 0..limit {
                let open = prev_close;
                let close = state.tick_price();
                let high = open.max(close) * (Decimal::ONE + Decimal::new(5, 4));
                let low = open.min(close) * (Decimal::ONE - Decimal::new(5, 4));
                let volume = Decimal::from(state.rng.gen_range(100..1000));
                let ts = now - Duration::hours((limit - i) as i64);
                candles.push(Candle::new(
                    ts,
                    Price::new(open),
                    Price::new(high),
                    Price::new(low),
                    Price::new(close),
                    volume,
                ));
                prev_close = close;
            }
            Ok(candles)
        })
    }

    fn place_order(&self, request: OrderRequest) -> BoxFuture<'_, BrokerResult<Order>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let mut state = self.state.lock();
            if state.fail_submissions > 0 {
                state.fail_submissions -= 1;
                return Err(BrokerError::Submission("simulated rejection".to_string()));
            }

            let (status, price) = match request.kind {
                OrderKind::Market => {
                    let fill_price = state.tick_price();
                    (OrderStatus::Filled, Some(Price::new(fill_price)))
                }
                OrderKind::StopLoss | OrderKind::TakeProfit => (OrderStatus::Open, request.price),
            };

            let order = Order {
                id: OrderId::new(),
                symbol: request.symbol.clone(),
                side: request.side,
                amount: request.amount,
                kind: request.kind,
                price,
                status,
            };

            if status == OrderStatus::Filled {
                state.apply_fill(&request.symbol, request.side, request.amount);
            }
            state.orders.push(order.clone());
            debug!(order_id = %order.id, kind = %order.kind, status = %order.status, "Paper order placed");
            Ok(order)
        })
    }

    fn cancel_order(&self, id: OrderId) -> BoxFuture<'_, BrokerResult<bool>> {
        Box::pin(async move {
            self.ensure_connected()?;
            let mut state = self.state.lock();
            if state.fail_cancels > 0 {
                state.fail_cancels -= 1;
                return Err(BrokerError::Cancellation(id));
            }
            match state
                .orders
                .iter_mut()
                .find(|o| o.id == id && o.status == OrderStatus::Open)
            {
                Some(order) => {
                    order.status = OrderStatus::Cancelled;
                    debug!(order_id = %id, "Paper order cancelled");
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn broker() -> PaperBroker {
        PaperBroker::new(PaperBrokerConfig {
            base_price: dec!(50000),
            drift_bps: 0,
            seed: Some(7),
        })
    }

    fn symbol() -> Symbol {
        Symbol::pair("BTC", "EUR")
    }

    #[tokio::test]
    async fn test_market_order_fills_synchronously() {
        let broker = broker();
        let order = broker
            .place_order(OrderRequest::market(
                symbol(),
                OrderSide::Buy,
                Size::new(dec!(1)),
            ))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.price, Some(Price::new(dec!(50000))));

        let positions = broker.positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].amount, Size::new(dec!(1)));
    }

    #[tokio::test]
    async fn test_risk_order_rests_open() {
        let broker = broker();
        let order = broker
            .place_order(OrderRequest::stop_loss(
                symbol(),
                Size::new(dec!(1)),
                Price::new(dec!(49000)),
            ))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(broker.open_orders().await.unwrap().len(), 1);

        assert!(broker.fill_open_order(&order.id));
        assert_eq!(
            broker.order_status(order.id).await.unwrap(),
            OrderStatus::Filled
        );
        assert!(broker.open_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_open_order() {
        let broker = broker();
        let order = broker
            .place_order(OrderRequest::take_profit(
                symbol(),
                Size::new(dec!(1)),
                Price::new(dec!(52500)),
            ))
            .await
            .unwrap();
        assert!(broker.cancel_order(order.id.clone()).await.unwrap());
        // Second cancel is a no-op.
        assert!(!broker.cancel_order(order.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_order_status() {
        let broker = broker();
        let status = broker.order_status(OrderId::new()).await.unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[tokio::test]
    async fn test_disconnect_and_reconnect() {
        let broker = broker();
        broker.set_connected(false);
        assert!(!broker.is_connected());
        assert!(matches!(
            broker.current_price(symbol()).await,
            Err(BrokerError::Disconnected)
        ));

        broker.reconnect().await.unwrap();
        assert!(broker.is_connected());
        assert!(broker.current_price(symbol()).await.is_ok());
    }

    #[tokio::test]
    async fn test_simulated_submission_failure() {
        let broker = broker();
        broker.fail_next_submissions(1);
        let result = broker
            .place_order(OrderRequest::market(
                symbol(),
                OrderSide::Buy,
                Size::new(dec!(1)),
            ))
            .await;
        assert!(matches!(result, Err(BrokerError::Submission(_))));
        // Next one succeeds.
        let order = broker
            .place_order(OrderRequest::market(
                symbol(),
                OrderSide::Buy,
                Size::new(dec!(1)),
            ))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn test_candle_history() {
        let broker = broker();
        let candles = broker.candles(symbol(), 50).await.unwrap();
        assert_eq!(candles.len(), 50);
        assert!(candles[0].timestamp < candles[49].timestamp);
    }
}
