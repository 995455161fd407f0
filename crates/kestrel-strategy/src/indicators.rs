//! Indicator math over closing-price series.
//!
//! All functions return `None` when the series is too short, which
//! strategies translate into `Signal::Hold`.

use rust_decimal::Decimal;

/// Simple moving average over the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let sum: Decimal = window.iter().sum();
    Some(sum / Decimal::from(period as u64))
}

/// Exponential moving average over the whole series.
///
/// Seeded with the first value, multiplier `2 / (period + 1)`.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let multiplier = Decimal::TWO / Decimal::from(period as u64 + 1);
    let mut ema = values[0];
    for value in &values[1..] {
        ema = (*value - ema) * multiplier + ema;
    }
    Some(ema)
}

/// Relative Strength Index over the last `period` price changes.
///
/// Uses the plain average of gains and losses in the window. An
/// all-gain window reports 100.
pub fn rsi(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let deltas: Vec<Decimal> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let window = &deltas[deltas.len() - period..];

    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for delta in window {
        if delta.is_sign_positive() {
            gains += *delta;
        } else {
            losses -= *delta;
        }
    }

    let avg_gain = gains / Decimal::from(period as u64);
    let avg_loss = losses / Decimal::from(period as u64);

    if avg_loss.is_zero() {
        return Some(Decimal::ONE_HUNDRED);
    }
    let rs = avg_gain / avg_loss;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}
