// =============================================================================
// Historical Volatility - sample standard deviation of simple returns
// =============================================================================
//
//   r_i = (close_i - close_{i-1}) / close_{i-1}
//   σ   = sqrt( Σ (r_i - mean)² / (n - 1) )
//
// The `n - 1` (Bessel) divisor is intentional: the returns are a sample.

/// Sample standard deviation of the simple returns of `closes`.
///
/// Returns `0.0` when fewer than three closes are supplied, since the sample
/// variance of a single return is undefined. A zero previous close contributes
/// a zero return instead of dividing by zero.
pub fn calculate_volatility(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let sum_sq: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();

    (sum_sq / (n - 1.0)).sqrt()
}
