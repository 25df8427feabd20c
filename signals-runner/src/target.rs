//! Training labels: does price reach the target within the lookahead window?

use serde::{Deserialize, Serialize};

/// Label construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Required rise above the close, as a fraction.
    pub price_increase_pct: f64,
    /// Number of future bars whose highs are inspected.
    pub lookahead_candles: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            price_increase_pct: 0.03,
            lookahead_candles: 15,
        }
    }
}

/// Label row `i` positive when the highest high of bars `i+1 ..= i+lookahead`
/// reaches `close[i] * (1 + pct)`.
///
/// Rows without a full window of future bars, or whose window contains a NaN
/// high, are negative.
pub fn create_target(close: &[f64], high: &[f64], config: &TargetConfig) -> Vec<bool> {
    let n = close.len().min(high.len());
    let lookahead = config.lookahead_candles;

    (0..n)
        .map(|i| {
            if lookahead == 0 || i + lookahead >= n {
                return false;
            }
            let window = &high[i + 1..=i + lookahead];
            if window.iter().any(|h| h.is_nan()) {
                return false;
            }
            let future_high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            future_high >= close[i] * (1.0 + config.price_increase_pct)
        })
        .collect()
}
