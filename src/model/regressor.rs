// src/model/regressor.rs
// Ridge least squares, intercept unpenalised. Normal equations.

use serde::{Deserialize, Serialize};

use super::features::FeatureVec;

pub const RIDGE_LAMBDA: f64 = 1e-3;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ridge {
    pub intercept: f64,
    pub weights: Vec<f64>,
    pub lambda: f64,
}

impl Ridge {
    pub fn fit(x: &[FeatureVec], y: &[f64]) -> Self {
        Self::fit_with(x, y, RIDGE_LAMBDA)
    }

    pub fn fit_with(x: &[FeatureVec], y: &[f64], lambda: f64) -> Self {
        let width = x.first().map_or(0, |v| v.len());
        let dim = width + 1; // column 0 is the intercept
        let mut a = vec![vec![0.0f64; dim]; dim];
        let mut b = vec![0.0f64; dim];

        for (row, target) in x.iter().zip(y) {
            let mut z = Vec::with_capacity(dim);
            z.push(1.0);
            z.extend(row.iter().map(|v| *v as f64));
            for i in 0..dim {
                b[i] += z[i] * target;
                for j in 0..dim {
                    a[i][j] += z[i] * z[j];
                }
            }
        }
        for (i, row) in a.iter_mut().enumerate().skip(1) {
            row[i] += lambda;
        }

        let beta = solve(a, b).unwrap_or_else(|| {
            // Degenerate system: fall back to predicting the mean.
            let mean = if y.is_empty() { 0.0 } else { y.iter().sum::<f64>() / y.len() as f64 };
            let mut v = vec![0.0; dim];
            v[0] = mean;
            v
        });

        Self { intercept: beta[0], weights: beta[1..].to_vec(), lambda }
    }

    pub fn predict(&self, row: &FeatureVec) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row.iter())
                .map(|(w, v)| w * *v as f64)
                .sum::<f64>()
    }

    pub fn mse(&self, x: &[FeatureVec], y: &[f64]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let sum: f64 = x
            .iter()
            .zip(y)
            .map(|(row, t)| (self.predict(row) - t).powi(2))
            .sum();
        sum / x.len() as f64
    }
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for r in (col + 1)..n {
            let f = a[r][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for c in col..n {
                a[r][c] -= f * a[col][c];
            }
            b[r] -= f * b[col];
        }
    }

    let mut out = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[i][j] * out[j]).sum();
        out[i] = (b[i] - tail) / a[i][i];
    }
    Some(out)
}
