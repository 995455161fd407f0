//! Order status reconciliation.
//!
//! Each cycle, every order the ledger references plus every broker-open
//! order is checked against broker-reported status. Transitions to
//! `filled` close the owning position; transitions to `cancelled` clear
//! the stale reference so the risk pass can re-place the leg. Repeat
//! observations of the same status are no-ops, so reconciliation is
//! idempotent between broker-side changes.

use crate::position::PositionLedger;
use kestrel_broker::{BrokerResult, DynBroker};
use kestrel_core::{OrderId, OrderStatus};
use kestrel_notify::{Notifier, Priority};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

pub struct OrderMonitor {
    broker: DynBroker,
    notifier: Arc<Notifier>,
    /// Last observed status per order id.
    seen: HashMap<OrderId, OrderStatus>,
}

impl OrderMonitor {
    pub fn new(broker: DynBroker, notifier: Arc<Notifier>) -> Self {
        Self {
            broker,
            notifier,
            seen: HashMap::new(),
        }
    }

    /// Reconcile local references against broker-reported status.
    pub async fn reconcile(&mut self, ledger: &mut PositionLedger) -> BrokerResult<()> {
        let mut ids: HashSet<OrderId> = self
            .broker
            .open_orders()
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();
        for position in ledger.iter() {
            ids.extend(position.sl_order_id.iter().cloned());
            ids.extend(position.tp_order_id.iter().cloned());
        }

        for id in &ids {
            let status = self.broker.order_status(id.clone()).await?;
            if self.seen.get(id) == Some(&status) {
                continue;
            }

            match status {
                OrderStatus::Filled => self.on_filled(id, ledger).await,
                OrderStatus::Cancelled => self.on_cancelled(id, ledger).await,
                OrderStatus::Open | OrderStatus::Unknown => {
                    debug!(order_id = %id, %status, "Order observed");
                }
            }
            self.seen.insert(id.clone(), status);
        }

        // An id absent from both broker open orders and ledger references
        // is never consulted again; dropping it keeps the map bounded by
        // live orders instead of growing with every replaced stop.
        self.seen.retain(|id, _| ids.contains(id));
        Ok(())
    }

    async fn on_filled(&self, id: &OrderId, ledger: &mut PositionLedger) {
        info!(order_id = %id, "Order filled");
        self.notifier
            .send("Order Filled", &format!("Order {id} filled"), Priority::Low)
            .await;

        // A filled risk leg closes the position. The sibling order is now
        // orphaned; the broker does not auto-cancel it, the next risk pass
        // does.
        if let Some((symbol, leg)) = ledger.find_by_risk_order(id) {
            if let Some(position) = ledger.close(&symbol) {
                info!(
                    %symbol,
                    ?leg,
                    entry_price = %position.entry_price,
                    "Position closed by risk order fill"
                );
            }
        }
    }

    async fn on_cancelled(&self, id: &OrderId, ledger: &mut PositionLedger) {
        info!(order_id = %id, "Order cancelled");
        self.notifier
            .send(
                "Order Cancelled",
                &format!("Order {id} was cancelled"),
                Priority::Low,
            )
            .await;

        // Clear the stale reference so the leg is re-placed next cycle.
        if let Some((symbol, leg)) = ledger.find_by_risk_order(id) {
            if let Some(position) = ledger.get_mut(&symbol) {
                position.clear_risk_order(leg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use kestrel_broker::{Broker, PaperBroker, PaperBrokerConfig};
    use kestrel_core::{OrderRequest, Price, Size, Symbol};
    use rust_decimal_macros::dec;

    fn paper_broker() -> Arc<PaperBroker> {
        Arc::new(PaperBroker::new(PaperBrokerConfig {
            base_price: dec!(50000),
            drift_bps: 0,
            seed: Some(1),
        }))
    }

    fn symbol() -> Symbol {
        Symbol::pair("BTC", "EUR")
    }

    async fn position_with_risk_orders(broker: &PaperBroker) -> Position {
        let sl = broker
            .place_order(OrderRequest::stop_loss(
                symbol(),
                Size::new(dec!(1)),
                Price::new(dec!(49000)),
            ))
            .await
            .unwrap();
        let tp = broker
            .place_order(OrderRequest::take_profit(
                symbol(),
                Size::new(dec!(1)),
                Price::new(dec!(52500)),
            ))
            .await
            .unwrap();
        let mut position = Position::new(symbol(), Size::new(dec!(1)), Price::new(dec!(50000)));
        position.stop_loss = Some(Price::new(dec!(49000)));
        position.take_profit = Some(Price::new(dec!(52500)));
        position.sl_order_id = Some(sl.id);
        position.tp_order_id = Some(tp.id);
        position
    }

    #[tokio::test]
    async fn test_take_profit_fill_closes_position() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let mut monitor = OrderMonitor::new(broker.clone(), notifier);
        let mut ledger = PositionLedger::new();

        let position = position_with_risk_orders(&broker).await;
        let tp_id = position.tp_order_id.clone().unwrap();
        ledger.open(position).unwrap();

        // Baseline pass records open statuses.
        monitor.reconcile(&mut ledger).await.unwrap();
        records.lock().clear();

        broker.fill_open_order(&tp_id);
        monitor.reconcile(&mut ledger).await.unwrap();

        assert!(ledger.is_empty());
        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Order Filled");
        assert_eq!(records[0].priority, Priority::Low);
        // Sibling stop-loss is left resting for the orphan pass.
        drop(records);
        assert_eq!(broker.open_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let mut monitor = OrderMonitor::new(broker.clone(), notifier);
        let mut ledger = PositionLedger::new();

        let position = position_with_risk_orders(&broker).await;
        let tp_id = position.tp_order_id.clone().unwrap();
        ledger.open(position).unwrap();

        monitor.reconcile(&mut ledger).await.unwrap();
        broker.fill_open_order(&tp_id);
        monitor.reconcile(&mut ledger).await.unwrap();
        let count_after_fill = records.lock().len();

        // No broker-side change: second pass emits nothing and mutates
        // nothing.
        monitor.reconcile(&mut ledger).await.unwrap();
        assert_eq!(records.lock().len(), count_after_fill);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_departed_orders_pruned_from_seen_map() {
        let broker = paper_broker();
        let (notifier, _records) = Notifier::capturing();
        let mut monitor = OrderMonitor::new(broker.clone(), notifier);
        let mut ledger = PositionLedger::new();

        // Churn through resting orders the ledger never references, the
        // way trailing replacements do.
        let mut ids = Vec::new();
        for _ in 0..20 {
            let order = broker
                .place_order(OrderRequest::stop_loss(
                    symbol(),
                    Size::new(dec!(1)),
                    Price::new(dec!(49000)),
                ))
                .await
                .unwrap();
            ids.push(order.id);
        }
        monitor.reconcile(&mut ledger).await.unwrap();
        assert_eq!(monitor.seen.len(), 20);

        for id in ids {
            broker.cancel_order(id).await.unwrap();
        }
        monitor.reconcile(&mut ledger).await.unwrap();

        // Nothing open at the broker and nothing referenced locally: the
        // last-seen map must not retain the departed orders.
        assert!(monitor.seen.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_risk_order_clears_reference() {
        let broker = paper_broker();
        let (notifier, records) = Notifier::capturing();
        let mut monitor = OrderMonitor::new(broker.clone(), notifier);
        let mut ledger = PositionLedger::new();

        let position = position_with_risk_orders(&broker).await;
        let sl_id = position.sl_order_id.clone().unwrap();
        ledger.open(position).unwrap();

        monitor.reconcile(&mut ledger).await.unwrap();
        records.lock().clear();

        broker.cancel_order(sl_id.clone()).await.unwrap();
        monitor.reconcile(&mut ledger).await.unwrap();

        let position = ledger.get(&symbol()).unwrap();
        assert!(position.sl_order_id.is_none());
        assert!(position.tp_order_id.is_some());
        assert_eq!(records.lock()[0].title, "Order Cancelled");
    }
}
