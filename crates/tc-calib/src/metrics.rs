//! Goodness-of-fit of a calibration model against a dataset.

use crate::error::{CalibResult, validate_samples};
use crate::model::CalibrationModel;

/// Prediction error summary in gallons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub samples: usize,
}

/// Mean absolute and root-mean-square error of `model` over the samples.
pub fn evaluate(
    model: &CalibrationModel,
    heights: &[f64],
    volumes: &[f64],
) -> CalibResult<FitMetrics> {
    validate_samples(heights, volumes)?;

    let (abs_sum, sq_sum) = heights
        .iter()
        .zip(volumes)
        .fold((0.0, 0.0), |(abs_sum, sq_sum), (&h, &v)| {
            let err = model.predict(h) - v;
            (abs_sum + err.abs(), sq_sum + err * err)
        });
    let n = heights.len() as f64;

    Ok(FitMetrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        samples: heights.len(),
    })
}
