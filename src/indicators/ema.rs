// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = (close_t - EMA_{t-1}) * multiplier + EMA_{t-1}
//
// The output is index-aligned with the input: the value at `period - 1` is
// seeded with the SMA of the first `period` closes, and every slot before the
// seed is zero and carries no meaning.
// =============================================================================

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Otherwise the result has exactly `closes.len()` elements, with slots
/// `0..period - 1` left at zero.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }
    ema_aligned(closes, period)
}

/// Index-aligned EMA that never shrinks: when the input is shorter than
/// `period` every slot is zero.
///
/// MACD relies on this so that its lines always match the input length.
pub(crate) fn ema_aligned(closes: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![0.0; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    result[period - 1] = closes[..period].iter().sum::<f64>() / period as f64;

    for i in period..closes.len() {
        let prev = result[i - 1];
        result[i] = (closes[i] - prev) * multiplier + prev;
    }

    result
}
