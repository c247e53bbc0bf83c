//! Tank entity: dimensions, calibration dataset and trained model.

use tc_calib::{CalibrationModel, ModelKind, ModelTrainer, analytic_samples, volume_gallons};
use tc_core::{clamp_to, ensure_positive};
use tc_store::TankDef;

use crate::error::{AppError, AppResult};

/// Ordered `(height, volume)` calibration samples. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    heights: Vec<f64>,
    volumes: Vec<f64>,
}

impl Dataset {
    pub fn new(heights: Vec<f64>, volumes: Vec<f64>) -> AppResult<Self> {
        if heights.len() != volumes.len() {
            return Err(AppError::Validation(format!(
                "{} heights but {} volumes",
                heights.len(),
                volumes.len()
            )));
        }
        Ok(Self { heights, volumes })
    }

    /// Evenly spaced analytic samples over `[0, diameter]`.
    pub fn analytic(diameter: f64, length: f64, n_samples: usize) -> AppResult<Self> {
        let (heights, volumes) = analytic_samples(diameter, length, n_samples)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(Self { heights, volumes })
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.heights.iter().copied().zip(self.volumes.iter().copied())
    }

    /// Copy of this dataset with `points` appended, heights clamped to `[0, max_height]`.
    pub(crate) fn extended(&self, points: &[(f64, f64)], max_height: f64) -> Self {
        let mut next = self.clone();
        next.heights.reserve(points.len());
        next.volumes.reserve(points.len());
        for &(h, v) in points {
            next.heights.push(clamp_to(h, 0.0, max_height));
            next.volumes.push(v);
        }
        next
    }
}

/// Row of [`crate::TankRegistry::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct TankSummary {
    pub id: String,
    pub name: String,
    pub diameter: f64,
    pub length: f64,
    pub point_count: usize,
}

/// Snapshot of a tank for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct TankInfo {
    pub id: String,
    pub name: String,
    pub diameter: f64,
    pub length: f64,
    pub radius: f64,
    pub point_count: usize,
    pub model_kind: ModelKind,
}

#[derive(Debug, Clone)]
pub struct Tank {
    id: String,
    name: String,
    diameter: f64,
    length: f64,
    dataset: Dataset,
    model: CalibrationModel,
}

impl Tank {
    /// Build a tank and train its model on `dataset`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        diameter: f64,
        length: f64,
        dataset: Dataset,
        trainer: &ModelTrainer,
    ) -> AppResult<Self> {
        let diameter = ensure_positive(diameter, "diameter")?;
        let length = ensure_positive(length, "length")?;
        let model = trainer.train(dataset.heights(), dataset.volumes())?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            diameter,
            length,
            dataset,
            model,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> &CalibrationModel {
        &self.model
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model.kind()
    }

    /// Calibrated gallons at `height`, clamped into `[0, D]` first.
    pub fn predict(&self, height: f64) -> f64 {
        self.model.predict(clamp_to(height, 0.0, self.diameter))
    }

    /// Ideal-cylinder gallons at `height`.
    pub fn analytic_volume(&self, height: f64) -> f64 {
        volume_gallons(height, self.diameter, self.length)
    }

    pub fn summary(&self) -> TankSummary {
        TankSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            diameter: self.diameter,
            length: self.length,
            point_count: self.dataset.len(),
        }
    }

    pub fn info(&self) -> TankInfo {
        TankInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            diameter: self.diameter,
            length: self.length,
            radius: self.radius(),
            point_count: self.dataset.len(),
            model_kind: self.model_kind(),
        }
    }

    /// Swap in a dataset and the model trained on it, returning the old pair.
    pub(crate) fn replace_calibration(
        &mut self,
        dataset: Dataset,
        model: CalibrationModel,
    ) -> (Dataset, CalibrationModel) {
        let old_dataset = std::mem::replace(&mut self.dataset, dataset);
        let old_model = std::mem::replace(&mut self.model, model);
        (old_dataset, old_model)
    }

    pub(crate) fn to_def(&self) -> TankDef {
        TankDef {
            name: self.name.clone(),
            diameter: self.diameter,
            length: self.length,
            radius: self.radius(),
            heights: self.dataset.heights.clone(),
            volumes: self.dataset.volumes.clone(),
            model_type: Some(self.model_kind()),
        }
    }
}
