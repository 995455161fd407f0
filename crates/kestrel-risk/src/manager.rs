//! Stop-loss/take-profit placement, repair, and trailing adjustment.

use kestrel_broker::{BrokerResult, DynBroker};
use kestrel_core::{OrderRequest, Price};
use kestrel_ledger::{Position, PositionLedger};
use kestrel_notify::{Notifier, Priority};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Risk management settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Stop-loss distance below entry, percent.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,
    /// Take-profit distance above entry, percent.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Decimal,
    /// Whether the stop-loss trails price upward.
    #[serde(default = "default_use_trailing_stop")]
    pub use_trailing_stop: bool,
    /// Trailing distance below current price, percent.
    #[serde(default = "default_trailing_stop_pct")]
    pub trailing_stop_pct: Decimal,
}

fn default_stop_loss_pct() -> Decimal {
    Decimal::TWO
}

fn default_take_profit_pct() -> Decimal {
    Decimal::from(5)
}

fn default_use_trailing_stop() -> bool {
    true
}

fn default_trailing_stop_pct() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
            use_trailing_stop: default_use_trailing_stop(),
            trailing_stop_pct: default_trailing_stop_pct(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.stop_loss_pct <= Decimal::ZERO || self.stop_loss_pct >= Decimal::ONE_HUNDRED {
            return Err(format!("stop_loss_pct out of range: {}", self.stop_loss_pct));
        }
        if self.take_profit_pct <= Decimal::ZERO {
            return Err(format!(
                "take_profit_pct out of range: {}",
                self.take_profit_pct
            ));
        }
        if self.use_trailing_stop
            && (self.trailing_stop_pct <= Decimal::ZERO
                || self.trailing_stop_pct >= Decimal::ONE_HUNDRED)
        {
            return Err(format!(
                "trailing_stop_pct out of range: {}",
                self.trailing_stop_pct
            ));
        }
        Ok(())
    }
}

/// Places, repairs, and trails protective orders for open positions.
pub struct RiskManager {
    broker: DynBroker,
    notifier: Arc<Notifier>,
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(broker: DynBroker, notifier: Arc<Notifier>, config: RiskConfig) -> Self {
        Self {
            broker,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Stop-loss and take-profit levels for an entry at `price`.
    pub fn protective_levels(&self, price: Price) -> (Price, Price) {
        (
            price.pct_below(self.config.stop_loss_pct),
            price.pct_above(self.config.take_profit_pct),
        )
    }

    /// Record protective levels on a fresh position and place both legs.
    ///
    /// On partial failure the successfully placed leg keeps its id and the
    /// caller retries the missing leg on the next cycle via
    /// [`ensure_protected`](Self::ensure_protected).
    pub async fn place_entry_risk_orders(
        &self,
        position: &mut Position,
        stop_loss: Price,
        take_profit: Price,
    ) -> BrokerResult<()> {
        position.stop_loss = Some(stop_loss);
        position.take_profit = Some(take_profit);
        self.ensure_protected(position).await
    }

    /// Place any missing protective leg at the recorded level.
    ///
    /// Levels missing from the position (cancel-without-replace) are
    /// recomputed from the entry price. Both legs are attempted even if
    /// the first fails; the first error is returned after both attempts
    /// so a position is never left silently unprotected.
    pub async fn ensure_protected(&self, position: &mut Position) -> BrokerResult<()> {
        let mut first_error = None;

        if position.sl_order_id.is_none() {
            let level = position
                .stop_loss
                .unwrap_or_else(|| position.entry_price.pct_below(self.config.stop_loss_pct));
            let request =
                OrderRequest::stop_loss(position.symbol.clone(), position.amount, level);
            match self.broker.place_order(request).await {
                Ok(order) => {
                    info!(symbol = %position.symbol, %level, order_id = %order.id, "Stop-loss placed");
                    position.stop_loss = Some(level);
                    position.sl_order_id = Some(order.id);
                }
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "Stop-loss placement failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if position.tp_order_id.is_none() {
            let level = position
                .take_profit
                .unwrap_or_else(|| position.entry_price.pct_above(self.config.take_profit_pct));
            let request =
                OrderRequest::take_profit(position.symbol.clone(), position.amount, level);
            match self.broker.place_order(request).await {
                Ok(order) => {
                    info!(symbol = %position.symbol, %level, order_id = %order.id, "Take-profit placed");
                    position.take_profit = Some(level);
                    position.tp_order_id = Some(order.id);
                }
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "Take-profit placement failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => {
                self.notifier
                    .send(
                        "Risk Order Placement Failed",
                        &format!(
                            "Position {} is missing protective orders, retrying next cycle",
                            position.symbol
                        ),
                        Priority::Medium,
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Tighten the stop-loss as price moves favorably.
    ///
    /// Long-only: the candidate stop sits `trailing_stop_pct` below the
    /// current price and is applied only when it is above the recorded
    /// stop. An unset stop always accepts the first candidate. The old
    /// stop order is cancelled best-effort; the take-profit leg is never
    /// touched here.
    pub async fn adjust_trailing_stop(
        &self,
        position: &mut Position,
        current_price: Price,
    ) -> BrokerResult<()> {
        if !self.config.use_trailing_stop {
            return Ok(());
        }

        let candidate = current_price.pct_below(self.config.trailing_stop_pct);
        let applies = match position.stop_loss {
            Some(stop) => candidate > stop,
            None => true,
        };
        if !applies {
            return Ok(());
        }

        if let Some(old_id) = position.sl_order_id.take() {
            match self.broker.cancel_order(old_id.clone()).await {
                Ok(_) => {}
                Err(e) => {
                    // Replacement proceeds; the stale order is swept by the
                    // orphan pass once the new reference is recorded.
                    warn!(order_id = %old_id, error = %e, "Failed to cancel old stop-loss");
                }
            }
        }

        let request =
            OrderRequest::stop_loss(position.symbol.clone(), position.amount, candidate);
        let order = self.broker.place_order(request).await?;
        position.stop_loss = Some(candidate);
        position.sl_order_id = Some(order.id);
        info!(symbol = %position.symbol, new_stop = %candidate, "Trailing stop adjusted");
        Ok(())
    }

    /// Cancel open risk orders no ledger position references.
    ///
    /// Covers the sibling left behind when one leg fills, risk orders
    /// surviving a signal-driven exit, and stale stops whose cancel failed
    /// during a trailing replacement. Individual cancel failures are
    /// logged and retried next cycle. Returns the number cancelled.
    pub async fn cancel_orphans(&self, ledger: &PositionLedger) -> BrokerResult<usize> {
        let open_orders = self.broker.open_orders().await?;
        let mut cancelled = 0;
        for order in open_orders {
            if !order.kind.is_risk_order() {
                continue;
            }
            if ledger.find_by_risk_order(&order.id).is_some() {
                continue;
            }
            match self.broker.cancel_order(order.id.clone()).await {
                Ok(true) => {
                    info!(order_id = %order.id, kind = %order.kind, "Orphaned risk order cancelled");
                    cancelled += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Failed to cancel orphaned risk order");
                }
            }
        }
        Ok(cancelled)
    }
}
