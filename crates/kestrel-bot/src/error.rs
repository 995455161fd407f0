//! Engine error types and the cycle-boundary error policy.

use kestrel_backup::BackupError;
use kestrel_broker::BrokerError;
use kestrel_ledger::LedgerError;
use kestrel_strategy::StrategyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Error classification at the cycle boundary.
///
/// The orchestrator matches on the variant: `Recoverable` is logged and
/// notified, and the next cycle still runs; `Fatal` terminates the loop.
/// The split is enforced here by the `From` impls rather than by
/// catch-all handling at the call sites.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("recoverable: {0}")]
    Recoverable(EngineError),

    #[error("fatal: {0}")]
    Fatal(EngineError),
}

impl From<EngineError> for CycleError {
    fn from(e: EngineError) -> Self {
        match e {
            // Bad configuration or an unbuildable strategy can only be
            // fixed by an operator.
            EngineError::Config(_) | EngineError::Strategy(_) => Self::Fatal(e),
            _ => Self::Recoverable(e),
        }
    }
}

impl From<BrokerError> for CycleError {
    fn from(e: BrokerError) -> Self {
        Self::Recoverable(EngineError::Broker(e))
    }
}

impl From<LedgerError> for CycleError {
    fn from(e: LedgerError) -> Self {
        Self::Recoverable(EngineError::Ledger(e))
    }
}

impl From<BackupError> for CycleError {
    fn from(e: BackupError) -> Self {
        Self::Recoverable(EngineError::Backup(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_errors_are_recoverable() {
        let cycle: CycleError = BrokerError::Disconnected.into();
        assert!(matches!(cycle, CycleError::Recoverable(_)));
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let cycle: CycleError = EngineError::Config("missing symbol".to_string()).into();
        assert!(matches!(cycle, CycleError::Fatal(_)));
    }
}
