//! Entry and exit order execution.
//!
//! Converts a directional signal into a market order. Entry hands the
//! filled position to the risk manager for protective-order placement;
//! exit removes the ledger entry and leaves any still-open risk orders for
//! the next orphan pass.

use crate::error::EngineResult;
use kestrel_broker::DynBroker;
use kestrel_core::{OrderRequest, OrderSide, OrderStatus, Size, Symbol};
use kestrel_ledger::{Position, PositionLedger};
use kestrel_notify::{Notifier, Priority};
use kestrel_risk::RiskManager;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Opens a position from a BUY signal.
pub struct EntryExecutor {
    broker: DynBroker,
    notifier: Arc<Notifier>,
    risk: Arc<RiskManager>,
    trade_amount: Size,
    max_positions: usize,
}

impl EntryExecutor {
    pub fn new(
        broker: DynBroker,
        notifier: Arc<Notifier>,
        risk: Arc<RiskManager>,
        trade_amount: Size,
        max_positions: usize,
    ) -> Self {
        Self {
            broker,
            notifier,
            risk,
            trade_amount,
            max_positions,
        }
    }

    /// Submit a market buy and, on fill, open a protected ledger position.
    ///
    /// Protective levels are computed from the price fetched immediately
    /// before submission; staleness between decision and fill is accepted.
    /// At the position cap or with a position already open for the symbol
    /// this is a logged no-op.
    pub async fn execute_buy(
        &self,
        symbol: &Symbol,
        ledger: &mut PositionLedger,
    ) -> EngineResult<()> {
        if ledger.len() >= self.max_positions {
            debug!(
                open = ledger.len(),
                max = self.max_positions,
                "Max positions reached, skipping entry"
            );
            return Ok(());
        }
        if ledger.contains(symbol) {
            debug!(%symbol, "Position already open, skipping entry");
            return Ok(());
        }

        let price = self.broker.current_price(symbol.clone()).await?;
        let (stop_loss, take_profit) = self.risk.protective_levels(price);

        let request = OrderRequest::market(symbol.clone(), OrderSide::Buy, self.trade_amount);
        let order = match self.broker.place_order(request).await {
            Ok(order) => order,
            Err(e) => {
                error!(%symbol, error = %e, "Entry order submission failed");
                self.notifier
                    .send(
                        "Entry Order Failed",
                        &format!("Market buy for {symbol} failed: {e}"),
                        Priority::High,
                    )
                    .await;
                return Err(e.into());
            }
        };

        if order.status != OrderStatus::Filled {
            warn!(%symbol, order_id = %order.id, status = %order.status, "Entry order not filled");
            self.notifier
                .send(
                    "Entry Order Not Filled",
                    &format!("Market buy {} for {symbol} reported {}", order.id, order.status),
                    Priority::High,
                )
                .await;
            return Ok(());
        }

        let entry_price = order.price.unwrap_or(price);
        let mut position = Position::new(symbol.clone(), order.amount, entry_price);
        if let Err(e) = self
            .risk
            .place_entry_risk_orders(&mut position, stop_loss, take_profit)
            .await
        {
            // The position still enters the ledger; the missing leg is
            // repaired by the next risk pass.
            warn!(%symbol, error = %e, "Protective orders incomplete after entry");
        }
        ledger.open(position)?;

        info!(%symbol, amount = %order.amount, %entry_price, "Position opened");
        self.notifier
            .send(
                "Position Opened",
                &format!("Bought {} {symbol} at {entry_price}", order.amount),
                Priority::Medium,
            )
            .await;
        Ok(())
    }
}

/// Closes a position from a SELL signal.
pub struct ExitExecutor {
    broker: DynBroker,
    notifier: Arc<Notifier>,
}

impl ExitExecutor {
    pub fn new(broker: DynBroker, notifier: Arc<Notifier>) -> Self {
        Self { broker, notifier }
    }

    /// Submit a market sell sized to the ledger position and remove it on
    /// fill.
    ///
    /// No position is a no-op. Risk orders are deliberately not cancelled
    /// here; the next orphan pass sweeps them.
    pub async fn execute_sell(
        &self,
        symbol: &Symbol,
        ledger: &mut PositionLedger,
    ) -> EngineResult<()> {
        let Some(position) = ledger.get(symbol) else {
            debug!(%symbol, "No open position to close");
            return Ok(());
        };
        let amount = position.amount;

        let request = OrderRequest::market(symbol.clone(), OrderSide::Sell, amount);
        let order = match self.broker.place_order(request).await {
            Ok(order) => order,
            Err(e) => {
                error!(%symbol, error = %e, "Exit order submission failed");
                self.notifier
                    .send(
                        "Exit Order Failed",
                        &format!("Market sell for {symbol} failed: {e}"),
                        Priority::High,
                    )
                    .await;
                return Err(e.into());
            }
        };

        if order.status != OrderStatus::Filled {
            warn!(%symbol, order_id = %order.id, status = %order.status, "Exit order not filled");
            self.notifier
                .send(
                    "Exit Order Not Filled",
                    &format!("Market sell {} for {symbol} reported {}", order.id, order.status),
                    Priority::High,
                )
                .await;
            return Ok(());
        }

        if let Some(closed) = ledger.close(symbol) {
            let exit_price = order.price;
            info!(
                %symbol,
                entry_price = %closed.entry_price,
                exit_price = ?exit_price,
                "Position closed by signal"
            );
            self.notifier
                .send(
                    "Position Closed",
                    &format!("Sold {amount} {symbol}"),
                    Priority::Medium,
                )
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_broker::{Broker, PaperBroker, PaperBrokerConfig};
    use kestrel_core::Price;
    use kestrel_risk::RiskConfig;
    use rust_decimal_macros::dec;

    fn paper_broker() -> Arc<PaperBroker> {
        Arc::new(PaperBroker::new(PaperBrokerConfig {
            base_price: dec!(50000),
            drift_bps: 0,
            seed: Some(11),
        }))
    }

    fn symbol() -> Symbol {
        Symbol::pair("BTC", "EUR")
    }

    fn entry_executor(
        broker: Arc<PaperBroker>,
        notifier: Arc<Notifier>,
        max_positions: usize,
    ) -> EntryExecutor {
        let risk = Arc::new(RiskManager::new(
            broker.clone(),
            notifier.clone(),
            RiskConfig::default(),
        ));
        EntryExecutor::new(broker, notifier, risk, Size::new(dec!(1)), max_positions)
    }

    #[tokio::test]
    async fn test_buy_opens_position_with_exact_levels() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let executor = entry_executor(broker.clone(), notifier, 1);
        let mut ledger = PositionLedger::new();

        executor.execute_buy(&symbol(), &mut ledger).await.unwrap();

        let position = ledger.get(&symbol()).unwrap();
        assert_eq!(position.entry_price, Price::new(dec!(50000)));
        assert_eq!(position.stop_loss, Some(Price::new(dec!(49000))));
        assert_eq!(position.take_profit, Some(Price::new(dec!(52500))));
        assert!(position.is_protected());
        assert_eq!(broker.open_orders().await.unwrap().len(), 2);
        assert!(records.lock().iter().any(|r| r.title == "Position Opened"));
    }

    #[tokio::test]
    async fn test_buy_at_position_cap_is_noop() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let executor = entry_executor(broker.clone(), notifier, 1);
        let mut ledger = PositionLedger::new();
        ledger
            .open(Position::new(
                Symbol::pair("ETH", "EUR"),
                Size::new(dec!(1)),
                Price::new(dec!(3000)),
            ))
            .unwrap();

        executor.execute_buy(&symbol(), &mut ledger).await.unwrap();

        assert_eq!(ledger.len(), 1);
        assert!(broker.open_orders().await.unwrap().is_empty());
        assert!(records.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_entry_notifies_without_ledger_change() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let executor = entry_executor(broker.clone(), notifier, 1);
        let mut ledger = PositionLedger::new();

        broker.fail_next_submissions(1);
        let result = executor.execute_buy(&symbol(), &mut ledger).await;

        assert!(result.is_err());
        assert!(ledger.is_empty());
        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Entry Order Failed");
        assert_eq!(records[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn test_sell_closes_position() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let executor = ExitExecutor::new(broker.clone(), notifier);
        let mut ledger = PositionLedger::new();
        ledger
            .open(Position::new(
                symbol(),
                Size::new(dec!(1)),
                Price::new(dec!(50000)),
            ))
            .unwrap();

        executor.execute_sell(&symbol(), &mut ledger).await.unwrap();

        assert!(ledger.is_empty());
        let records = records.lock();
        assert_eq!(records[0].title, "Position Closed");
        assert_eq!(records[0].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_sell_without_position_is_noop() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let executor = ExitExecutor::new(broker, notifier);
        let mut ledger = PositionLedger::new();

        executor.execute_sell(&symbol(), &mut ledger).await.unwrap();
        assert!(records.lock().is_empty());
    }
}
