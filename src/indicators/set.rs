// =============================================================================
// Indicator Set - concurrent fan-out over one price series
// =============================================================================
//
// The five indicator computations share nothing but the read-only closes, so
// they run as independent tasks on the rayon pool and are joined before the
// bundle is returned. None of them can fail; the only rejection happens before
// anything is spawned, when the series is too short to mean anything.
// =============================================================================

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::macd::{calculate_macd, MacdLines};
use super::rsi::calculate_rsi;
use super::sma::moving_average;
use super::volatility::calculate_volatility;

/// Minimum number of closes required before any indicator is computed.
pub const MIN_CLOSES: usize = 2;

const SHORT_MA_WINDOW: usize = 100;
const LONG_MA_WINDOW: usize = 200;
const RSI_PERIOD: usize = 14;

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("not enough close prices: got {got}, need at least {required}")]
    InsufficientData { got: usize, required: usize },
}

/// Immutable bundle of every indicator computed for one request.
///
/// Sub-results that lacked enough data are reported as empty vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ma100: Vec<f64>,
    pub ma200: Vec<f64>,
    pub rsi: Vec<f64>,
    pub volatility: f64,
    #[serde(flatten)]
    pub macd: MacdLines,
}

/// Compute the full [`IndicatorSet`] for `closes`, running each indicator
/// concurrently and waiting for all of them.
pub fn compute_indicators(closes: &[f64]) -> Result<IndicatorSet, IndicatorError> {
    if closes.len() < MIN_CLOSES {
        return Err(IndicatorError::InsufficientData {
            got: closes.len(),
            required: MIN_CLOSES,
        });
    }

    let mut set = IndicatorSet::default();
    {
        let IndicatorSet {
            ma100,
            ma200,
            rsi,
            volatility,
            macd,
        } = &mut set;

        rayon::scope(|s| {
            s.spawn(move |_| *ma100 = moving_average(closes, SHORT_MA_WINDOW));
            s.spawn(move |_| *ma200 = moving_average(closes, LONG_MA_WINDOW));
            s.spawn(move |_| *rsi = calculate_rsi(closes, RSI_PERIOD));
            s.spawn(move |_| *volatility = calculate_volatility(closes));
            s.spawn(move |_| *macd = calculate_macd(closes));
        });
    }

    debug!(
        closes = closes.len(),
        ma100 = set.ma100.len(),
        ma200 = set.ma200.len(),
        rsi = set.rsi.len(),
        volatility = set.volatility,
        "indicator set computed"
    );

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::ema::calculate_ema;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn rejects_empty_and_single_close() {
        assert_eq!(
            compute_indicators(&[]),
            Err(IndicatorError::InsufficientData { got: 0, required: 2 })
        );
        assert_eq!(
            compute_indicators(&[101.5]),
            Err(IndicatorError::InsufficientData { got: 1, required: 2 })
        );
    }

    #[test]
    fn two_closes_report_empty_sub_results() {
        let set = compute_indicators(&[100.0, 101.0]).unwrap();
        assert!(set.ma100.is_empty());
        assert!(set.ma200.is_empty());
        assert!(set.rsi.is_empty());
        assert_eq!(set.volatility, 0.0);
        assert_eq!(set.macd.macd.len(), 2);
    }

    #[test]
    fn matches_sequential_computation() {
        let closes: Vec<f64> = (0..250)
            .map(|i| 100.0 + (i as f64 * 0.17).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        let set = compute_indicators(&closes).unwrap();

        assert_eq!(set.ma100, moving_average(&closes, 100));
        assert_eq!(set.ma200, moving_average(&closes, 200));
        assert_eq!(set.rsi, calculate_rsi(&closes, 14));
        assert_eq!(set.volatility, calculate_volatility(&closes));
        assert_eq!(set.macd, calculate_macd(&closes));
        assert_eq!(set.ma100.len(), 151);
        assert_eq!(set.ma200.len(), 51);
        assert_eq!(set.rsi.len(), 236);
        assert_eq!(set.macd.signal.len(), 250);
        // Sanity: the slow EMA behind the MACD is seeded.
        assert_eq!(calculate_ema(&closes, 26).len(), 250);
    }

    #[test]
    fn serialises_with_flat_macd_keys() {
        let set = compute_indicators(&ramp(30)).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["ma100", "ma200", "rsi", "volatility", "macd", "signal", "histogram"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(obj["volatility"].is_number());
        assert!(obj["ma100"].as_array().unwrap().is_empty());
    }
}
