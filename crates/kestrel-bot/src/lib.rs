//! Cycle orchestration for the Kestrel trading bot.
//!
//! Ties the broker gateway, order monitor, risk manager, strategy, and
//! executors together into the fixed-interval trading cycle, and owns the
//! run/stop state machine.

pub mod app;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod executor;
pub mod logging;

pub use app::{EngineState, TradingEngine};
pub use config::{AppConfig, TradingConfig};
pub use connectivity::ConnectivityMonitor;
pub use error::{CycleError, EngineError, EngineResult};
pub use executor::{EntryExecutor, ExitExecutor};
pub use logging::init_logging;
