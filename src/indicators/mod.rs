// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators returned by the
// `/metric` endpoint. Insufficient input yields an empty result (or zero for
// volatility) rather than an error; only `set::compute_indicators` rejects a
// request outright.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod set;
pub mod sma;
pub mod volatility;

pub use set::{compute_indicators, IndicatorError, IndicatorSet};
