//! Calibration model contract and variant selection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "ensemble")]
use crate::ensemble::{ForestParams, ForestRegressor};
use crate::error::{CalibResult, validate_samples};
use crate::interp::InterpModel;

/// Whether the bagged-tree implementation was compiled into this build.
pub const fn ensemble_available() -> bool {
    cfg!(feature = "ensemble")
}

/// Tag identifying which variant a tank's model is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Bagged regression trees. Files written by older releases use `sklearn_rf`.
    #[serde(alias = "sklearn_rf")]
    Ensemble,
    /// Piecewise-linear interpolation.
    Interp,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Ensemble => "ensemble",
            ModelKind::Interp => "interp",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which variant the trainer should reach for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPreference {
    /// Ensemble when compiled in, interpolation otherwise.
    #[default]
    Auto,
    /// Always interpolate.
    Interp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub n_estimators: usize,
    pub seed: u64,
    pub min_samples_leaf: usize,
    pub preference: ModelPreference,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            seed: 42,
            min_samples_leaf: 1,
            preference: ModelPreference::Auto,
        }
    }
}

/// A trained height→volume model.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationModel {
    Interp(InterpModel),
    #[cfg(feature = "ensemble")]
    Ensemble(ForestRegressor),
}

impl CalibrationModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            CalibrationModel::Interp(_) => ModelKind::Interp,
            #[cfg(feature = "ensemble")]
            CalibrationModel::Ensemble(_) => ModelKind::Ensemble,
        }
    }

    /// Volume in gallons. Callers clamp `height` into the tank's range first.
    pub fn predict(&self, height: f64) -> f64 {
        match self {
            CalibrationModel::Interp(model) => model.predict(height),
            #[cfg(feature = "ensemble")]
            CalibrationModel::Ensemble(model) => model.predict(height),
        }
    }
}

/// Builds calibration models from datasets.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Variant the next `train` call will produce.
    pub fn selected_kind(&self) -> ModelKind {
        match self.config.preference {
            ModelPreference::Interp => ModelKind::Interp,
            ModelPreference::Auto if ensemble_available() => ModelKind::Ensemble,
            ModelPreference::Auto => ModelKind::Interp,
        }
    }

    pub fn train(&self, heights: &[f64], volumes: &[f64]) -> CalibResult<CalibrationModel> {
        validate_samples(heights, volumes)?;

        let kind = self.selected_kind();
        if kind == ModelKind::Interp && self.config.preference == ModelPreference::Auto {
            debug!("ensemble support not compiled in, falling back to interpolation");
        }

        let model = match kind {
            #[cfg(feature = "ensemble")]
            ModelKind::Ensemble => {
                let params = ForestParams {
                    n_estimators: self.config.n_estimators,
                    seed: self.config.seed,
                    min_samples_leaf: self.config.min_samples_leaf,
                };
                CalibrationModel::Ensemble(ForestRegressor::fit(heights, volumes, &params)?)
            }
            _ => CalibrationModel::Interp(InterpModel::fit(heights, volumes)?),
        };

        debug!(kind = %model.kind(), samples = heights.len(), "trained calibration model");
        Ok(model)
    }
}
