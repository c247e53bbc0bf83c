//! Piecewise-linear calibration over the sorted dataset.

use crate::error::{CalibResult, validate_samples};

/// Linear interpolation through the training samples, sorted by height.
///
/// Heights that appear more than once keep the most recently inserted volume,
/// so a fresh calibration point always overrides an older reading at the same
/// height. Outside the sampled range the boundary volumes are held constant.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpModel {
    heights: Vec<f64>,
    volumes: Vec<f64>,
}

impl InterpModel {
    pub fn fit(heights: &[f64], volumes: &[f64]) -> CalibResult<Self> {
        validate_samples(heights, volumes)?;

        // `+ 0.0` folds -0.0 into 0.0 so both land in one knot
        let mut pairs: Vec<(f64, f64)> = heights
            .iter()
            .map(|&h| h + 0.0)
            .zip(volumes.iter().copied())
            .collect();
        // Stable: equal heights stay in insertion order
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut xs: Vec<f64> = Vec::with_capacity(pairs.len());
        let mut ys: Vec<f64> = Vec::with_capacity(pairs.len());
        for (h, v) in pairs {
            match xs.last() {
                Some(&last) if last == h => {
                    if let Some(y) = ys.last_mut() {
                        *y = v;
                    }
                }
                _ => {
                    xs.push(h);
                    ys.push(v);
                }
            }
        }

        Ok(Self {
            heights: xs,
            volumes: ys,
        })
    }

    pub fn predict(&self, height: f64) -> f64 {
        let n = self.heights.len();
        let first = self.heights[0];
        let last = self.heights[n - 1];
        if height <= first || height.is_nan() {
            return self.volumes[0];
        }
        if height >= last {
            return self.volumes[n - 1];
        }

        // first index with x > height; 1 <= upper <= n - 1 here
        let upper = self.heights.partition_point(|&x| x <= height);
        let lower = upper - 1;
        let (x0, x1) = (self.heights[lower], self.heights[upper]);
        let (y0, y1) = (self.volumes[lower], self.volumes[upper]);
        let t = (height - x0) / (x1 - x0);
        y0 + t * (y1 - y0)
    }

    /// Number of distinct heights the model interpolates through.
    pub fn knot_count(&self) -> usize {
        self.heights.len()
    }
}
