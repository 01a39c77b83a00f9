use serde::{Deserialize, Serialize};

use super::{sigmoid, ProbabilisticClassifier};

/// Gradient-boosted decision stumps over log-loss.
///
/// Each round fits a single-split regression stump to the gradient/hessian
/// statistics of the current predictions, XGBoost-style with an L2 leaf
/// penalty. Hyperparameters are fixed constants; automatic search is out of
/// scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtConfig {
    /// Boosting rounds.
    pub rounds: usize,
    /// Shrinkage applied to every stump's contribution.
    pub learning_rate: f64,
    /// Maximum candidate thresholds evaluated per feature.
    pub max_bins: usize,
    /// Minimum samples on each side of a split.
    pub min_leaf: usize,
    /// L2 penalty on leaf values.
    pub lambda: f64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            rounds: 80,
            learning_rate: 0.1,
            max_bins: 32,
            min_leaf: 2,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl Stump {
    fn output(&self, row: &[f64]) -> f64 {
        let x = row.get(self.feature).copied().unwrap_or(0.0);
        if x <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtClassifier {
    config: GbdtConfig,
    base_score: f64,
    stumps: Vec<Stump>,
}

impl GbdtClassifier {
    pub fn new(config: GbdtConfig) -> Self {
        Self {
            config,
            base_score: 0.0,
            stumps: Vec::new(),
        }
    }

    /// Candidate thresholds for one feature: evenly spaced quantile midpoints
    /// over the sorted distinct values.
    fn thresholds(values: &mut Vec<f64>, max_bins: usize) -> Vec<f64> {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            return Vec::new();
        }
        let cuts = values.len().saturating_sub(1).min(max_bins);
        (1..=cuts)
            .map(|i| {
                let idx = i * (values.len() - 1) / cuts;
                let lo = values[idx.saturating_sub(1).max(0)];
                let hi = values[idx];
                (lo + hi) / 2.0
            })
            .collect()
    }
}

impl ProbabilisticClassifier for GbdtClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> anyhow::Result<()> {
        if x.is_empty() || x.len() != y.len() {
            anyhow::bail!("gbdt: empty or mismatched training input");
        }
        let n = x.len();
        let dims = x[0].len();

        let pos = y.iter().filter(|&&l| l == 1).count() as f64;
        let prior = (pos / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.base_score = (prior / (1.0 - prior)).ln();
        self.stumps.clear();

        // Per-feature candidate thresholds, computed once.
        let candidates: Vec<Vec<f64>> = (0..dims)
            .map(|f| {
                let mut vals: Vec<f64> = x.iter().map(|row| row[f]).collect();
                Self::thresholds(&mut vals, self.config.max_bins)
            })
            .collect();

        let mut scores = vec![self.base_score; n];

        for _ in 0..self.config.rounds {
            // Gradient/hessian of log-loss at current scores.
            let mut grad = vec![0.0; n];
            let mut hess = vec![0.0; n];
            for i in 0..n {
                let p = sigmoid(scores[i]);
                grad[i] = y[i] as f64 - p;
                hess[i] = (p * (1.0 - p)).max(1e-12);
            }
            let total_g: f64 = grad.iter().sum();
            let total_h: f64 = hess.iter().sum();

            let mut best: Option<(f64, Stump)> = None;
            for f in 0..dims {
                for &t in &candidates[f] {
                    let mut gl = 0.0;
                    let mut hl = 0.0;
                    let mut nl = 0usize;
                    for i in 0..n {
                        if x[i][f] <= t {
                            gl += grad[i];
                            hl += hess[i];
                            nl += 1;
                        }
                    }
                    let nr = n - nl;
                    if nl < self.config.min_leaf || nr < self.config.min_leaf {
                        continue;
                    }
                    let gr = total_g - gl;
                    let hr = total_h - hl;
                    let lambda = self.config.lambda;
                    let gain = gl * gl / (hl + lambda) + gr * gr / (hr + lambda)
                        - total_g * total_g / (total_h + lambda);
                    if best.as_ref().map_or(true, |(g, _)| gain > *g) {
                        best = Some((
                            gain,
                            Stump {
                                feature: f,
                                threshold: t,
                                left_value: gl / (hl + lambda),
                                right_value: gr / (hr + lambda),
                            },
                        ));
                    }
                }
            }

            let Some((gain, stump)) = best else { break };
            if gain <= 1e-12 {
                break;
            }
            for i in 0..n {
                scores[i] += self.config.learning_rate * stump.output(&x[i]);
            }
            self.stumps.push(stump);
        }
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        let mut score = self.base_score;
        for stump in &self.stumps {
            score += self.config.learning_rate * stump.output(row);
        }
        sigmoid(score)
    }
}
