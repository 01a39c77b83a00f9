use serde::{Deserialize, Serialize};

use super::{sigmoid, ProbabilisticClassifier};

/// Logistic regression trained by full-batch gradient descent.
///
/// Doubles as the interpretable single-model tier and as the stacking
/// meta-learner, where its coefficients are the per-base-model ensemble
/// weights. Inputs are standardized internally; the learned weights are
/// folded back into raw feature space before being stored, so prediction
/// and the exported coefficients both operate on raw inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.3,
            l2: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    config: LogisticConfig,
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticClassifier {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            bias: 0.0,
        }
    }

    /// Raw-space coefficients, one per input feature.
    pub fn coefficients(&self) -> &[f64] {
        &self.weights
    }
}

impl ProbabilisticClassifier for LogisticClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> anyhow::Result<()> {
        if x.is_empty() || x.len() != y.len() {
            anyhow::bail!("logistic: empty or mismatched training input");
        }
        let n = x.len();
        let dims = x[0].len();

        // Standardize for stable gradient steps.
        let mut mean = vec![0.0; dims];
        let mut std = vec![0.0; dims];
        for row in x {
            for (j, v) in row.iter().enumerate() {
                mean[j] += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n as f64;
        }
        for row in x {
            for (j, v) in row.iter().enumerate() {
                std[j] += (v - mean[j]).powi(2);
            }
        }
        for s in std.iter_mut() {
            *s = (*s / n as f64).sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        let z: Vec<Vec<f64>> = x
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, v)| (v - mean[j]) / std[j])
                    .collect()
            })
            .collect();

        let mut w = vec![0.0; dims];
        let mut b = 0.0;
        for _ in 0..self.config.epochs {
            let mut gw = vec![0.0; dims];
            let mut gb = 0.0;
            for i in 0..n {
                let p = sigmoid(z[i].iter().zip(&w).map(|(v, wj)| v * wj).sum::<f64>() + b);
                let err = p - y[i] as f64;
                for j in 0..dims {
                    gw[j] += err * z[i][j];
                }
                gb += err;
            }
            for j in 0..dims {
                w[j] -= self.config.learning_rate * (gw[j] / n as f64 + self.config.l2 * w[j]);
            }
            b -= self.config.learning_rate * gb / n as f64;
        }

        // Fold standardization back into raw-space weights.
        self.weights = (0..dims).map(|j| w[j] / std[j]).collect();
        self.bias = b - (0..dims).map(|j| w[j] * mean[j] / std[j]).sum::<f64>();
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }
}
