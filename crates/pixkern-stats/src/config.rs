//! Histogram operator configuration.
//!
//! [`HistogramConfig`] describes histogram geometry, the sampling grid and an
//! optional threshold method. It is a plain serde struct, loadable from YAML:
//!
//! ```yaml
//! num_bins: [64]
//! low_value: [0.0]
//! high_value: [256.0]
//! grid:
//!   x_period: 2
//!   y_period: 2
//! threshold:
//!   method: p_tile
//!   p: 0.25
//! ```
//!
//! Missing fields take the operator defaults: 256 bins over `[0, 256)` and
//! every pixel sampled. Arrays shorter than the band count are padded with
//! their first element.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::histogram::{Histogram, SampleGrid, ThresholdMethod};

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or applying a [`HistogramConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Config file not found.
    #[error("config file not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Values parse but describe an invalid histogram.
    #[error("invalid histogram config: {0}")]
    Invalid(#[from] pixkern_core::Error),
}

/// Histogram geometry, sampling grid and threshold method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Bins per band.
    pub num_bins: Vec<usize>,
    /// Inclusive lower bound per band.
    pub low_value: Vec<f64>,
    /// Exclusive upper bound per band.
    pub high_value: Vec<f64>,
    /// Sampling lattice.
    pub grid: SampleGrid,
    /// Threshold method applied by [`thresholds`](Self::thresholds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<ThresholdMethod>,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            num_bins: vec![256],
            low_value: vec![0.0],
            high_value: vec![256.0],
            grid: SampleGrid::default(),
            threshold: None,
        }
    }
}

impl HistogramConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Loads a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "loading histogram config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serializes to YAML.
    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the config against `num_bands` without allocating bins.
    pub fn validate(&self, num_bands: usize) -> ConfigResult<()> {
        self.build(num_bands).map(|_| ())
    }

    /// Builds an empty histogram with `num_bands` bands.
    pub fn build(&self, num_bands: usize) -> ConfigResult<Histogram> {
        self.grid.validate()?;
        let histogram =
            Histogram::with_bands(&self.num_bins, &self.low_value, &self.high_value, num_bands)?;
        Ok(histogram)
    }

    /// Applies the configured threshold method, if any.
    pub fn thresholds(&self, histogram: &Histogram) -> ConfigResult<Option<Vec<f64>>> {
        match self.threshold {
            Some(method) => Ok(Some(histogram.threshold(method)?)),
            None => Ok(None),
        }
    }
}
