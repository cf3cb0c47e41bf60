// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of every contiguous `window` of closes, sliding by one
// element at a time. The output is shorter than the input by `window - 1`.

/// Calculate the rolling SMA of `closes` over `window`.
///
/// Returns an empty vec when `window == 0` or there are fewer than `window`
/// closes. Otherwise the result has `closes.len() - window + 1` values.
pub fn moving_average(closes: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || closes.len() < window {
        return Vec::new();
    }

    let divisor = window as f64;
    closes
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / divisor)
        .collect()
}
