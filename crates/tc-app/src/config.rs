//! Session configuration, optionally read from a YAML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tc_calib::TrainerConfig;

use crate::error::{AppError, AppResult};
use crate::registry::DEFAULT_ANALYTIC_SAMPLES;

pub const DEFAULT_STORE_FILE: &str = "tanks_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Registry document. `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
    /// Write the registry after every successful mutation.
    pub autosave: bool,
    /// Samples per analytic dataset, including both endpoints.
    pub analytic_samples: usize,
    pub trainer: TrainerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: Some(PathBuf::from(DEFAULT_STORE_FILE)),
            autosave: true,
            analytic_samples: DEFAULT_ANALYTIC_SAMPLES,
            trainer: TrainerConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn in_memory() -> Self {
        Self {
            store_path: None,
            autosave: false,
            ..Self::default()
        }
    }

    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Load from a YAML file. Missing keys take their defaults.
    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: SessionConfig = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.analytic_samples < 2 {
            return Err(AppError::Config(format!(
                "analytic_samples must be at least 2, got {}",
                self.analytic_samples
            )));
        }
        if self.trainer.n_estimators == 0 {
            return Err(AppError::Config("trainer.n_estimators must be positive".to_string()));
        }
        if self.trainer.min_samples_leaf == 0 {
            return Err(AppError::Config(
                "trainer.min_samples_leaf must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
