// =============================================================================
// MACD - Moving Average Convergence / Divergence
// =============================================================================
//
//   macd[i]      = EMA12[i] - EMA26[i]
//   signal       = EMA9(macd)
//   histogram[i] = macd[i] - signal[i]
//
// All three lines are index-aligned with the input closes. Slots below 25
// subtract unseeded (zero) EMA values and must not be read as signals; the
// first fully meaningful MACD value is at index 25 and the first meaningful
// signal value several bars later.
// =============================================================================

use serde::Serialize;

use super::ema::ema_aligned;

const FAST_PERIOD: usize = 12;
const SLOW_PERIOD: usize = 26;
const SIGNAL_PERIOD: usize = 9;

/// The three MACD lines, each with the same length as the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute the standard 12/26/9 MACD for `closes`.
pub fn calculate_macd(closes: &[f64]) -> MacdLines {
    let fast = ema_aligned(closes, FAST_PERIOD);
    let slow = ema_aligned(closes, SLOW_PERIOD);

    let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_aligned(&macd, SIGNAL_PERIOD);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdLines {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::ema::calculate_ema;

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn macd_lengths_match_input() {
        let closes = ramp(30);
        let lines = calculate_macd(&closes);
        assert_eq!(lines.macd.len(), closes.len());
        assert_eq!(lines.signal.len(), closes.len());
        assert_eq!(lines.histogram.len(), closes.len());
    }

    #[test]
    fn macd_lengths_match_short_input() {
        let closes = ramp(5);
        let lines = calculate_macd(&closes);
        assert_eq!(lines.macd.len(), 5);
        assert_eq!(lines.signal.len(), 5);
        assert_eq!(lines.histogram.len(), 5);
    }

    #[test]
    fn macd_is_fast_minus_slow_after_warmup() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let lines = calculate_macd(&closes);
        let ema12 = calculate_ema(&closes, 12);
        let ema26 = calculate_ema(&closes, 26);

        for i in 25..closes.len() {
            assert!((lines.macd[i] - (ema12[i] - ema26[i])).abs() < 1e-10);
            assert!((lines.histogram[i] - (lines.macd[i] - lines.signal[i])).abs() < 1e-10);
        }
    }

    #[test]
    fn macd_flat_series_is_zero_once_seeded() {
        let lines = calculate_macd(&vec![50.0; 80]);
        for i in 25..80 {
            assert!(lines.macd[i].abs() < 1e-10);
            assert!((lines.histogram[i] + lines.signal[i]).abs() < 1e-10);
        }
        // The signal line keeps decaying from the warm-up artefact.
        assert!(lines.signal[79].abs() < lines.signal[40].abs());
    }
}
