//! TOML configuration for training and prediction.
//!
//! Every section and field is optional; omitted values fall back to the
//! standard settings (3% over 15 bars for labels, 1% stop / 3% target /
//! 2-bar timeout for exits, 80/20 chronological split).
//!
//! ```toml
//! [model]
//! n_estimators = 200
//! learning_rate = 0.05
//!
//! [training]
//! test_fraction = 0.25
//!
//! [target]
//! lookahead_candles = 10
//! ```

use serde::{Deserialize, Serialize};
use signals_core::ExitPolicy;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::BoostingParams;
use crate::target::TargetConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Hold-out settings for training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Trailing fraction of rows held out for the accuracy check.
    pub test_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { test_fraction: 0.2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalsConfig {
    pub model: BoostingParams,
    pub training: TrainingConfig,
    pub target: TargetConfig,
    pub exit: ExitPolicy,
}

impl SignalsConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.exit
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let frac = self.training.test_fraction;
        if !(0.0..1.0).contains(&frac) {
            return Err(ConfigError::Invalid(format!(
                "training.test_fraction must be in [0, 1), got {frac}"
            )));
        }
        if !(self.target.price_increase_pct > 0.0 && self.target.price_increase_pct.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "target.price_increase_pct must be positive, got {}",
                self.target.price_increase_pct
            )));
        }
        if self.target.lookahead_candles == 0 {
            return Err(ConfigError::Invalid(
                "target.lookahead_candles must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
