//! Protective order management.
//!
//! The risk manager owns everything about stop-loss/take-profit pairs:
//! level computation, placement and repair, trailing-stop tightening,
//! and cancellation of orphaned legs whose position no longer exists.

pub mod manager;

pub use manager::{RiskConfig, RiskManager};
