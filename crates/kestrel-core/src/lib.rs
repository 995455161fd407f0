//! Core domain types for the Kestrel trading bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Symbol`: instrument identifier
//! - `Price`, `Size`: precision-safe numeric types
//! - `Order`, `OrderRequest`, `OrderId`: broker order model
//! - `Signal`, `Candle`: strategy inputs and outputs

pub mod candle;
pub mod decimal;
pub mod error;
pub mod order;
pub mod signal;
pub mod symbol;

pub use candle::Candle;
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::{Order, OrderId, OrderKind, OrderRequest, OrderSide, OrderStatus};
pub use signal::Signal;
pub use symbol::Symbol;
