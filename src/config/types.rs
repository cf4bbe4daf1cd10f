use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app_dirs::{self, AppDirError};

pub const MIN_EPOCHS: usize = 1;
pub const MAX_EPOCHS: usize = 10_000;
pub(super) const MAX_BATCH_SIZE: usize = 60_000;

/// Settings that belong in the TOML config file.
///
/// Config keys: `training`, `models_dir`, `dataset_dir`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub training: TrainingSettings,
    /// Optional override for where trained artifacts are written.
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
    /// Optional override for the Fashion-MNIST cache folder.
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,
}

impl AppSettings {
    pub(crate) fn normalized(mut self) -> Self {
        self.training = self.training.normalized();
        self
    }

    /// Directory holding saved model artifacts.
    pub fn resolved_models_dir(&self) -> Result<PathBuf, AppDirError> {
        match &self.models_dir {
            Some(dir) => app_dirs::ensure_dir(dir.clone()),
            None => app_dirs::models_dir(),
        }
    }

    /// Directory holding the cached dataset archives.
    pub fn resolved_dataset_dir(&self) -> Result<PathBuf, AppDirError> {
        match &self.dataset_dir {
            Some(dir) => app_dirs::ensure_dir(dir.clone()),
            None => app_dirs::dataset_dir(),
        }
    }
}

/// Hyperparameters for a training session.
///
/// Config keys: `epochs`, `batch_size`, `learning_rate`, `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            seed: default_seed(),
        }
    }
}

impl TrainingSettings {
    fn normalized(mut self) -> Self {
        self.epochs = self.epochs.clamp(MIN_EPOCHS, MAX_EPOCHS);
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            self.learning_rate = default_learning_rate();
        }
        self
    }
}

fn default_epochs() -> usize {
    20
}

fn default_batch_size() -> usize {
    100
}

fn default_learning_rate() -> f32 {
    0.001
}

fn default_seed() -> u64 {
    42
}
