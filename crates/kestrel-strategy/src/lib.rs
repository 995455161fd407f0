//! Signal sources for the Kestrel trading bot.
//!
//! A [`SignalSource`] turns recent candle history into a discrete
//! [`Signal`]. Strategies are infallible by design: anything that prevents
//! a decision (insufficient history, degenerate data) yields `Hold`.

pub mod config;
pub mod indicators;
pub mod ma_crossover;
pub mod rsi;
pub mod trend;

pub use config::{StrategyConfig, StrategyError};
pub use ma_crossover::MaCrossover;
pub use rsi::RsiStrategy;
pub use trend::TrendFollowing;

use kestrel_core::{Candle, Signal};

/// A strategy that produces a directional signal from candle history.
pub trait SignalSource: Send {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Evaluate the signal for the given history, oldest candle first.
    fn generate_signal(&mut self, candles: &[Candle]) -> Signal;
}
