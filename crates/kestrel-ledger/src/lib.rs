//! Position ledger and order reconciliation.
//!
//! The ledger is the authoritative in-process record of open positions,
//! at most one per instrument. The order monitor reconciles locally
//! referenced orders against broker-reported status each cycle.

pub mod error;
pub mod monitor;
pub mod position;

pub use error::{LedgerError, LedgerResult};
pub use monitor::OrderMonitor;
pub use position::{Position, PositionLedger, RiskLeg};
