//! Small descriptive-statistics helpers shared across the crate.

use serde::{Deserialize, Serialize};

/// Arithmetic mean; `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0); `None` for an empty slice.
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Root-mean-square error between two equal-length sampled curves.
///
/// Callers guarantee equal lengths (the [`crate::curve::NormalizedCurve`]
/// type does so structurally).
#[must_use]
pub fn rmse(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f64;
    let sum_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    (sum_sq / n).sqrt()
}

/// Mean, population standard deviation and sample count for one group cell.
///
/// `n` is the number of subjects that actually contributed a value; with
/// partial coverage it can be smaller than the batch size, and consumers
/// must not assume otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStat {
    pub mean: f64,
    pub std_dev: f64,
    pub n: usize,
}

impl DescriptiveStat {
    /// Summarize a set of per-subject values; `None` when empty.
    #[must_use]
    pub fn of(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std_dev: std_dev(values)?,
            n: values.len(),
        })
    }
}
