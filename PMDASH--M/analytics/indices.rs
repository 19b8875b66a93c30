//! Earned-value performance indices.
//!
//! A zero denominator is a degenerate signal rather than an error: both
//! calculators return `0.0` so a batch never halts on it.

/// Rounds to `places` decimals from the exact binary value, ties to even.
///
/// `0.8995` is stored just below the tie and rounds to `0.899`.
#[must_use]
pub fn round_to(value: f64, places: usize) -> f64 {
    // Display output of any f64, NaN and infinities included, parses back.
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// SPI = earned value / planned value, rounded to 3 decimals.
///
/// SPI above 1.0 means ahead of schedule. Returns `0.0` when `planned_value` is zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn calculate_schedule_performance_index(earned_value: f64, planned_value: f64) -> f64 {
    if planned_value == 0.0 {
        return 0.0;
    }
    let spi = earned_value / planned_value;
    tracing::debug!(spi, "calculated SPI");
    round_to(spi, 3)
}

/// CPI = earned value / actual cost, rounded to 3 decimals.
///
/// CPI above 1.0 means under budget. Returns `0.0` when `actual_cost` is zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn calculate_cost_performance_index(earned_value: f64, actual_cost: f64) -> f64 {
    if actual_cost == 0.0 {
        return 0.0;
    }
    let cpi = earned_value / actual_cost;
    tracing::debug!(cpi, "calculated CPI");
    round_to(cpi, 3)
}
