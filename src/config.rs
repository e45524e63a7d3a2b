//! Training configuration.
//!
//! A [`TrainingConfig`] can be built in code or read from a JSON file:
//!
//! ```json
//! {
//!   "iterations": 5000,
//!   "alpha": 0.05,
//!   "verbose": true,
//!   "graph": false,
//!   "step": 100
//! }
//! ```
//!
//! Missing fields fall back to [`TrainingConfig::default`].

use crate::error::{NetworkError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hyper-parameters and reporting switches for [`DeepNetwork::train`].
///
/// [`DeepNetwork::train`]: crate::network::DeepNetwork::train
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of gradient descent passes over the whole batch.
    pub iterations: usize,
    /// Learning rate.
    pub alpha: f64,
    /// Log every sampled cost through `tracing`.
    pub verbose: bool,
    /// Hand every sampled cost to the caller's sink for plotting.
    pub graph: bool,
    /// Sampling interval in iterations; only checked when `verbose` or `graph` is set.
    pub step: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: 5000,
            alpha: 0.05,
            verbose: true,
            graph: true,
            step: 100,
        }
    }
}

impl TrainingConfig {
    /// True when cost samples are produced at all.
    pub fn reporting(&self) -> bool {
        self.verbose || self.graph
    }

    /// Checks the preconditions of a training run.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(NetworkError::invalid("iterations must be a positive integer"));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(NetworkError::invalid("alpha must be positive"));
        }
        if self.reporting() && (self.step == 0 || self.step > self.iterations) {
            return Err(NetworkError::invalid("step must be positive and <= iterations"));
        }
        Ok(())
    }
}

/// Loads and validates a training configuration from a JSON file.
///
/// A file that cannot be read yields [`NetworkError::NotFound`]; malformed
/// JSON or a config failing [`TrainingConfig::validate`] yields
/// [`NetworkError::InvalidArgument`].
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| NetworkError::not_found(format!("{}: {}", path.display(), e)))?;
    let config: TrainingConfig = serde_json::from_str(&contents)
        .map_err(|e| NetworkError::invalid(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_classic_exercise() {
        let cfg = TrainingConfig::default();
        assert_eq!(cfg.iterations, 5000);
        assert_eq!(cfg.alpha, 0.05);
        assert!(cfg.verbose && cfg.graph);
        assert_eq!(cfg.step, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_iterations_and_alpha() {
        let zero_iters = TrainingConfig { iterations: 0, ..Default::default() };
        assert!(matches!(zero_iters.validate(), Err(NetworkError::InvalidArgument(_))));

        for alpha in [0.0, -0.05, f64::NAN, f64::INFINITY] {
            let cfg = TrainingConfig { alpha, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(NetworkError::InvalidArgument(_))), "{alpha}");
        }
    }

    #[test]
    fn step_only_checked_when_reporting() {
        let cfg = TrainingConfig { iterations: 10, step: 11, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = TrainingConfig { iterations: 10, step: 0, verbose: false, graph: true, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = TrainingConfig { iterations: 10, step: 10, ..Default::default() };
        assert!(cfg.validate().is_ok());
        let silent = TrainingConfig { iterations: 10, step: 0, verbose: false, graph: false, ..Default::default() };
        assert!(silent.validate().is_ok());
    }

    #[test]
    fn load_partial_config_fills_defaults() {
        let file = write_json(r#"{ "iterations": 200, "alpha": 0.5, "graph": false }"#);
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.iterations, 200);
        assert_eq!(cfg.alpha, 0.5);
        assert!(cfg.verbose);
        assert!(!cfg.graph);
        assert_eq!(cfg.step, 100);
    }

    #[test]
    fn load_reports_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_config(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(NetworkError::NotFound(_))));

        let garbage = write_json("{ iterations: ");
        assert!(matches!(load_config(garbage.path()), Err(NetworkError::InvalidArgument(_))));

        let invalid = write_json(r#"{ "iterations": 5, "step": 6 }"#);
        assert!(matches!(load_config(invalid.path()), Err(NetworkError::InvalidArgument(_))));
    }
}
