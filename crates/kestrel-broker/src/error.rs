//! Broker gateway error types.
//!
//! Every broker error is recoverable from the engine's point of view:
//! the cycle that hit it logs, notifies, and retries on the next pass.

use kestrel_core::OrderId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker disconnected")]
    Disconnected,

    #[error("Order submission failed: {0}")]
    Submission(String),

    #[error("Order cancellation failed for {0}")]
    Cancellation(OrderId),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
