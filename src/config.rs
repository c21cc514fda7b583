//! Run configuration for the training pipeline.
//!
//! Defaults come from the chosen `Architecture`; a JSON file may replace any
//! subset of fields and command-line flags are applied last.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Error, IoContext, Result};
use crate::network::Architecture;
use crate::optim::OptimizerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
    pub shuffle: bool,
    /// Scale pixels to `[0, 1]` on load. Off by default: the networks are
    /// trained on raw 0-255 values.
    pub normalize: bool,
    /// Dataset directory; the architecture's default when `None`.
    pub data_dir: Option<PathBuf>,
    /// Root under which checkpoint, log and model directories are created.
    pub output_dir: PathBuf,
    pub model_dir: PathBuf,
    /// Use only the first N training samples.
    pub train_limit: Option<usize>,
    /// The architecture's default optimizer when `None`.
    pub optimizer: Option<OptimizerConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            epochs: 100,
            batch_size: 128,
            seed: 0,
            shuffle: true,
            normalize: false,
            data_dir: None,
            output_dir: PathBuf::from("."),
            model_dir: PathBuf::from("models"),
            train_limit: None,
            optimizer: None,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub learning_rate: Option<f32>,
    pub seed: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub train_limit: Option<usize>,
    pub normalize: bool,
}

impl RunConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<RunConfig> {
        let path = path.as_ref();
        let file = File::open(path).at_path(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Resolves the optimizer, falling back to the architecture's default.
    pub fn optimizer_for(&self, arch: Architecture) -> OptimizerConfig {
        self.optimizer.clone().unwrap_or_else(|| arch.default_optimizer())
    }

    pub fn data_dir_for(&self, arch: Architecture) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(arch.dataset().default_dir()))
    }

    pub fn apply_overrides(&mut self, arch: Architecture, o: &Overrides) {
        if let Some(v) = o.epochs { self.epochs = v; }
        if let Some(v) = o.batch_size { self.batch_size = v; }
        if let Some(v) = o.seed { self.seed = v; }
        if let Some(v) = &o.data_dir { self.data_dir = Some(v.clone()); }
        if let Some(v) = &o.output_dir { self.output_dir = v.clone(); }
        if let Some(v) = o.train_limit { self.train_limit = Some(v); }
        if o.normalize {
            self.normalize = true;
        }
        if let Some(lr) = o.learning_rate {
            self.optimizer = Some(self.optimizer_for(arch).with_learning_rate(lr));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be > 0".into()));
        }
        if let Some(opt) = &self.optimizer {
            let lr = opt.learning_rate();
            if !(lr > 0.0 && lr.is_finite()) {
                return Err(Error::Config(format!("learning rate must be positive, got {}", lr)));
            }
        }
        if self.train_limit == Some(0) {
            return Err(Error::Config("train_limit must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: RunConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.batch_size, 128);
        assert!(!cfg.normalize);
    }

    #[test]
    fn overrides_win_and_learning_rate_keeps_optimizer_kind() {
        let mut cfg = RunConfig::default();
        cfg.apply_overrides(Architecture::Tf2, &Overrides {
            epochs: Some(2),
            learning_rate: Some(0.01),
            normalize: true,
            ..Overrides::default()
        });
        assert_eq!(cfg.epochs, 2);
        assert!(cfg.normalize);
        assert_eq!(cfg.optimizer, Some(OptimizerConfig::adam().with_learning_rate(0.01)));
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut cfg = RunConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.batch_size = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        cfg.batch_size = 1;
        cfg.optimizer = Some(OptimizerConfig::Sgd { learning_rate: -1.0 });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"seed": 9, "optimizer": {"type": "sgd", "learning_rate": 0.05}}"#).unwrap();
        let cfg = RunConfig::load_json(&path).unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.optimizer_for(Architecture::Tf1).learning_rate(), 0.05);
    }
}
