//! Bagged regression trees over a single height feature.
//!
//! Each tree is grown on a Poisson bootstrap of the dataset until every leaf
//! is pure (one distinct height or one distinct volume) or would drop below
//! `min_samples_leaf`. Split thresholds sit halfway between adjacent distinct
//! heights, and the forest prediction is the mean over trees. A fixed seed makes
//! training fully deterministic.

use rand::distributions::Standard;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{CalibResult, validate_samples};

/// Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            seed: 42,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Grow a tree on samples already sorted by height.
    fn grow(sample: &[(f64, f64)], min_samples_leaf: usize) -> Self {
        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut pending = vec![(0_usize, 0_usize, sample.len())];

        while let Some((slot, lo, hi)) = pending.pop() {
            let part = &sample[lo..hi];
            match best_split(part, min_samples_leaf) {
                Some((n_left, threshold)) => {
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(TreeNode::Leaf { value: 0.0 });
                    nodes.push(TreeNode::Leaf { value: 0.0 });
                    nodes[slot] = TreeNode::Split {
                        threshold,
                        left,
                        right,
                    };
                    pending.push((left, lo, lo + n_left));
                    pending.push((right, lo + n_left, hi));
                }
                None => {
                    nodes[slot] = TreeNode::Leaf {
                        value: mean_volume(part),
                    };
                }
            }
        }

        Self { nodes }
    }

    fn predict(&self, height: f64) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    threshold,
                    left,
                    right,
                } => idx = if height <= threshold { left } else { right },
            }
        }
    }
}

fn mean_volume(part: &[(f64, f64)]) -> f64 {
    part.iter().map(|&(_, v)| v).sum::<f64>() / part.len() as f64
}

/// Split minimizing the summed squared error of both sides.
///
/// Returns the number of samples going left and the threshold, or `None` when
/// the partition must become a leaf.
fn best_split(part: &[(f64, f64)], min_samples_leaf: usize) -> Option<(usize, f64)> {
    let n = part.len();
    if n < 2 * min_samples_leaf {
        return None;
    }

    let (lo_v, hi_v) = part
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });
    if hi_v - lo_v == 0.0 {
        return None;
    }

    let total: f64 = part.iter().map(|&(_, v)| v).sum();
    let mut left_sum = 0.0;
    let mut best: Option<(usize, f64, f64)> = None;

    for i in 0..n - 1 {
        left_sum += part[i].1;
        let n_left = i + 1;
        let n_right = n - n_left;
        if n_left < min_samples_leaf || n_right < min_samples_leaf {
            continue;
        }
        let (a, b) = (part[i].0, part[i + 1].0);
        if a >= b {
            continue;
        }

        // Minimizing SSE == maximizing sum_l²/n_l + sum_r²/n_r
        let right_sum = total - left_sum;
        let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
        if best.is_none_or(|(_, _, s)| score > s) {
            best = Some((n_left, midpoint(a, b), score));
        }
    }

    best.map(|(n_left, threshold, _)| (n_left, threshold))
}

/// Halfway point that still sends `a` left and `b` right.
fn midpoint(a: f64, b: f64) -> f64 {
    let mid = a + (b - a) / 2.0;
    if mid < b { mid } else { a }
}

/// Bagged regression-tree model mapping height to volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestRegressor {
    trees: Vec<RegressionTree>,
}

impl ForestRegressor {
    pub fn fit(heights: &[f64], volumes: &[f64], params: &ForestParams) -> CalibResult<Self> {
        validate_samples(heights, volumes)?;

        let n_estimators = params.n_estimators.max(1);
        let min_samples_leaf = params.min_samples_leaf.max(1);

        let trees = (0..n_estimators)
            .map(|tree| {
                let mut sample = bootstrap(heights, volumes, params.seed, tree as u64);
                sample.sort_by(|a, b| a.0.total_cmp(&b.0));
                RegressionTree::grow(&sample, min_samples_leaf)
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn predict(&self, height: f64) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(height)).sum();
        sum / self.trees.len() as f64
    }
}

/// Resample for one tree: sample `i` appears Poisson(1) times.
///
/// Every tree reads its own ChaCha stream and sample `i` always consumes the
/// `i`-th draw of it, so a sample's count never depends on how many samples
/// follow it. Appending a point leaves the existing counts untouched.
fn bootstrap(heights: &[f64], volumes: &[f64], seed: u64, tree: u64) -> Vec<(f64, f64)> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(tree);

    let mut sample = Vec::with_capacity(heights.len());
    for (&h, &v) in heights.iter().zip(volumes) {
        let copies = poisson_one(rng.sample(Standard));
        sample.extend(std::iter::repeat_n((h, v), copies));
    }
    if sample.is_empty() {
        sample.extend(heights.iter().copied().zip(volumes.iter().copied()));
    }
    sample
}

/// Inverse CDF of Poisson(1) at `u` in `[0, 1)`.
fn poisson_one(u: f64) -> usize {
    let mut k = 0;
    let mut p = (-1.0_f64).exp();
    let mut cdf = p;
    while u >= cdf && k < 32 {
        k += 1;
        p /= k as f64;
        cdf += p;
    }
    k
}
