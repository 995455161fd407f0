//! The trading engine: cycle sequencing and the run/stop state machine.

use crate::config::AppConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{CycleError, EngineResult};
use crate::executor::{EntryExecutor, ExitExecutor};
use kestrel_backup::BackupManager;
use kestrel_broker::DynBroker;
use kestrel_core::{Signal, Symbol};
use kestrel_ledger::{OrderMonitor, PositionLedger};
use kestrel_notify::{Notifier, Priority};
use kestrel_risk::RiskManager;
use kestrel_strategy::SignalSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Stopping,
}

/// Top-level cycle orchestrator.
///
/// Runs as a single task; the ledger is mutated only here, so positions
/// need no internal locking. Each cycle executes, in order: connectivity
/// check, order reconciliation, per-position risk repair and trailing
/// evaluation, orphan sweep, signal evaluation, entry/exit execution, and
/// a conditional backup.
pub struct TradingEngine {
    symbol: Symbol,
    check_interval: Duration,
    required_history: usize,
    broker: DynBroker,
    notifier: Arc<Notifier>,
    connectivity: ConnectivityMonitor,
    monitor: OrderMonitor,
    risk: Arc<RiskManager>,
    strategy: Box<dyn SignalSource>,
    entry: EntryExecutor,
    exit: ExitExecutor,
    backup: Option<BackupManager>,
    ledger: PositionLedger,
    state: EngineState,
}

impl TradingEngine {
    /// Build the engine from configuration alone.
    pub fn new(config: &AppConfig) -> EngineResult<Self> {
        let broker = kestrel_broker::connect(&config.broker)?;
        let notifier = Arc::new(Notifier::new(&config.notifications));
        let strategy = config.strategy.build()?;
        Self::assemble(config, broker, notifier, strategy)
    }

    /// Build the engine around externally supplied collaborators.
    pub fn assemble(
        config: &AppConfig,
        broker: DynBroker,
        notifier: Arc<Notifier>,
        strategy: Box<dyn SignalSource>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let risk = Arc::new(RiskManager::new(
            broker.clone(),
            notifier.clone(),
            config.risk.clone(),
        ));
        let backup = if config.backup.enabled {
            Some(BackupManager::new(&config.backup)?)
        } else {
            None
        };
        Ok(Self {
            symbol: config.trading.symbol.clone(),
            check_interval: Duration::from_secs(config.trading.check_interval_secs),
            required_history: config.strategy.required_history(),
            connectivity: ConnectivityMonitor::new(broker.clone(), notifier.clone()),
            monitor: OrderMonitor::new(broker.clone(), notifier.clone()),
            entry: EntryExecutor::new(
                broker.clone(),
                notifier.clone(),
                risk.clone(),
                config.trading.trade_amount,
                config.trading.max_positions,
            ),
            exit: ExitExecutor::new(broker.clone(), notifier.clone()),
            broker,
            notifier,
            risk,
            strategy,
            backup,
            ledger: PositionLedger::new(),
            state: EngineState::Stopped,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Run the cycle loop until shutdown is signalled or a fatal error
    /// occurs.
    ///
    /// The interval is the minimum time between cycle starts; a slow cycle
    /// delays the next one rather than overlapping it. Shutdown is honored
    /// at cycle boundaries only.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> EngineResult<()> {
        self.state = EngineState::Running;
        info!(symbol = %self.symbol, interval_secs = self.check_interval.as_secs(), "Trading engine started");
        self.notifier
            .send(
                "Bot Started",
                &format!(
                    "Trading {} every {}s",
                    self.symbol,
                    self.check_interval.as_secs()
                ),
                Priority::Medium,
            )
            .await;
        self.sync_exposure().await;

        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_cycle().await {
                        Ok(()) => {}
                        Err(CycleError::Recoverable(e)) => {
                            warn!(error = %e, "Cycle failed, continuing");
                            self.notifier
                                .send("Cycle Error", &e.to_string(), Priority::Medium)
                                .await;
                        }
                        Err(CycleError::Fatal(e)) => {
                            error!(error = %e, "Fatal error, shutting down");
                            self.stop().await;
                            return Err(e);
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Execute one full cycle.
    pub async fn run_cycle(&mut self) -> Result<(), CycleError> {
        self.connectivity.ensure_connected().await?;
        self.monitor.reconcile(&mut self.ledger).await?;

        for symbol in self.ledger.symbols() {
            let price = self.broker.current_price(symbol.clone()).await?;
            if let Some(position) = self.ledger.get_mut(&symbol) {
                self.risk.ensure_protected(position).await?;
                self.risk.adjust_trailing_stop(position, price).await?;
            }
        }
        self.risk.cancel_orphans(&self.ledger).await?;

        let candles = self
            .broker
            .candles(self.symbol.clone(), self.required_history)
            .await?;
        let signal = self.strategy.generate_signal(&candles);
        debug!(strategy = self.strategy.name(), %signal, "Signal evaluated");
        match signal {
            Signal::Buy => self.entry.execute_buy(&self.symbol, &mut self.ledger).await?,
            Signal::Sell => self.exit.execute_sell(&self.symbol, &mut self.ledger).await?,
            Signal::Hold => {}
        }

        if let Some(backup) = &mut self.backup {
            let state =
                serde_json::to_value(&self.ledger).map_err(kestrel_backup::BackupError::from)?;
            backup.auto_backup(state)?;
        }
        Ok(())
    }

    /// Final backup and shutdown notification.
    pub async fn stop(&mut self) {
        self.state = EngineState::Stopping;
        info!("Trading engine stopping");

        if let Some(backup) = &mut self.backup {
            match serde_json::to_value(&self.ledger) {
                Ok(state) => {
                    if let Err(e) = backup.create_backup(state) {
                        warn!(error = %e, "Final backup failed");
                    }
                }
                Err(e) => warn!(error = %e, "Could not serialize state for final backup"),
            }
        }

        self.notifier
            .send("Bot Stopped", "Trading engine shut down", Priority::Medium)
            .await;
        self.state = EngineState::Stopped;
    }

    /// Warn about broker-side exposure the ledger does not know about.
    ///
    /// The ledger starts empty on boot, so holdings surviving a restart
    /// show up here. They are reported, not adopted: re-entering them
    /// automatically would guess at entry prices.
    async fn sync_exposure(&self) {
        match self.broker.positions().await {
            Ok(positions) => {
                for held in positions {
                    if !self.ledger.contains(&held.symbol) {
                        warn!(
                            symbol = %held.symbol,
                            amount = %held.amount,
                            "Broker reports exposure not tracked locally"
                        );
                    }
                }
            }
            Err(e) => warn!(error = %e, "Could not fetch broker positions at startup"),
        }
    }
}
