//! Fixed exit policy: target, stop-loss, timeout.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, ExitReason};

/// Stop-loss sits 1% below entry.
pub const STOP_LOSS_FACTOR: f64 = 0.99;
/// Target sits 3% above entry.
pub const TARGET_FACTOR: f64 = 1.03;
/// Bars after entry at which an unresolved position exits at the close.
pub const MAX_HOLDING_BARS: usize = 2;

/// Out-of-range exit policy settings.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PolicyError {
    #[error("stop_loss_factor must be in (0, 1), got {0}")]
    StopLossFactor(f64),
    #[error("target_factor must be greater than 1, got {0}")]
    TargetFactor(f64),
}

/// Exit levels and holding limit, applied multiplicatively to the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitPolicy {
    pub stop_loss_factor: f64,
    pub target_factor: f64,
    pub max_holding_bars: usize,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self {
            stop_loss_factor: STOP_LOSS_FACTOR,
            target_factor: TARGET_FACTOR,
            max_holding_bars: MAX_HOLDING_BARS,
        }
    }
}

/// The single live position. Exists only between entry and exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_date: NaiveDateTime,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub target_price: f64,
}

impl ExitPolicy {
    /// Open a position at the bar's close.
    pub fn open(&self, index: usize, bar: &Bar) -> OpenPosition {
        let entry_price = bar.close;
        OpenPosition {
            entry_index: index,
            entry_date: bar.date,
            entry_price,
            stop_loss_price: entry_price * self.stop_loss_factor,
            target_price: entry_price * self.target_factor,
        }
    }

    /// First matching exit rule and its reference price.
    ///
    /// Priority is target, then stop, then timeout; the first match wins.
    pub fn check_exit(
        &self,
        position: &OpenPosition,
        index: usize,
        bar: &Bar,
    ) -> Option<(ExitReason, f64)> {
        if bar.high >= position.target_price {
            Some((ExitReason::Target, position.target_price))
        } else if bar.close <= position.stop_loss_price {
            Some((ExitReason::StopLoss, position.stop_loss_price))
        } else if index - position.entry_index >= self.max_holding_bars {
            Some((ExitReason::Timeout, bar.close))
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(self.stop_loss_factor > 0.0 && self.stop_loss_factor < 1.0) {
            return Err(PolicyError::StopLossFactor(self.stop_loss_factor));
        }
        if !(self.target_factor > 1.0 && self.target_factor.is_finite()) {
            return Err(PolicyError::TargetFactor(self.target_factor));
        }
        Ok(())
    }
}
