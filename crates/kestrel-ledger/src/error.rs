//! Ledger error types.

use kestrel_core::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Position already open for {0}")]
    PositionAlreadyOpen(Symbol),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
