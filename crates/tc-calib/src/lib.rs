//! tc-calib: volume-from-height models for horizontal cylindrical tanks.
//!
//! Provides:
//! - Closed-form geometry of a partially filled horizontal cylinder
//! - Calibration models trained on (height, volume) samples
//! - Fit metrics for comparing a model against a dataset
//!
//! # Architecture
//!
//! Two calibration variants sit behind [`CalibrationModel`]:
//! - [`InterpModel`]: piecewise-linear interpolation, always available
//! - `ForestRegressor`: bagged regression trees, compiled with the `ensemble` feature
//!
//! [`ModelTrainer`] picks the variant once, at training time, from
//! [`ensemble_available`] and the configured [`ModelPreference`].
//!
//! # Example
//!
//! ```
//! use tc_calib::{ModelTrainer, TrainerConfig, geometry};
//!
//! let (heights, volumes) = geometry::analytic_samples(45.0, 71.0, 361).unwrap();
//! let trainer = ModelTrainer::new(TrainerConfig::default());
//! let model = trainer.train(&heights, &volumes).unwrap();
//! let gallons = model.predict(22.5);
//! assert!((gallons - geometry::volume_gallons(22.5, 45.0, 71.0)).abs() < 2.0);
//! ```

#[cfg(feature = "ensemble")]
pub mod ensemble;
pub mod error;
pub mod geometry;
pub mod interp;
pub mod metrics;
pub mod model;

// Re-exports for ergonomics
#[cfg(feature = "ensemble")]
pub use ensemble::{ForestParams, ForestRegressor};
pub use error::{CalibError, CalibResult};
pub use geometry::{analytic_samples, fill_fraction, full_volume_gallons, tank_volume, volume_gallons};
pub use interp::InterpModel;
pub use metrics::{FitMetrics, evaluate};
pub use model::{
    CalibrationModel, ModelKind, ModelPreference, ModelTrainer, TrainerConfig, ensemble_available,
};
