use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{sigmoid, ProbabilisticClassifier};

/// Small feed-forward network: one tanh hidden layer, sigmoid output,
/// full-batch gradient descent on log-loss. Weight init is seeded so the
/// same dataset and seed always produce the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden: 8,
            epochs: 300,
            learning_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    config: MlpConfig,
    seed: u64,
    /// Input standardization, stored at fit time.
    mean: Vec<f64>,
    std: Vec<f64>,
    /// hidden x dims
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    /// 1 x hidden
    w2: Vec<f64>,
    b2: f64,
}

impl MlpClassifier {
    pub fn new(config: MlpConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            mean: Vec::new(),
            std: Vec::new(),
            w1: Vec::new(),
            b1: Vec::new(),
            w2: Vec::new(),
            b2: 0.0,
        }
    }

    fn standardize(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean.get(j).copied().unwrap_or(0.0)) / self.std.get(j).copied().unwrap_or(1.0))
            .collect()
    }

    fn forward(&self, z: &[f64]) -> (Vec<f64>, f64) {
        let hidden: Vec<f64> = self
            .w1
            .iter()
            .zip(&self.b1)
            .map(|(row, b)| (row.iter().zip(z).map(|(w, v)| w * v).sum::<f64>() + b).tanh())
            .collect();
        let out = sigmoid(
            self.w2.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f64>() + self.b2,
        );
        (hidden, out)
    }
}

impl ProbabilisticClassifier for MlpClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> anyhow::Result<()> {
        if x.is_empty() || x.len() != y.len() {
            anyhow::bail!("mlp: empty or mismatched training input");
        }
        let n = x.len();
        let dims = x[0].len();
        let hidden = self.config.hidden;

        self.mean = vec![0.0; dims];
        self.std = vec![0.0; dims];
        for row in x {
            for (j, v) in row.iter().enumerate() {
                self.mean[j] += v;
            }
        }
        for m in self.mean.iter_mut() {
            *m /= n as f64;
        }
        for row in x {
            for (j, v) in row.iter().enumerate() {
                self.std[j] += (v - self.mean[j]).powi(2);
            }
        }
        for s in self.std.iter_mut() {
            *s = (*s / n as f64).sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        let z: Vec<Vec<f64>> = x.iter().map(|row| self.standardize(row)).collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let scale = (1.0 / dims as f64).sqrt();
        self.w1 = (0..hidden)
            .map(|_| (0..dims).map(|_| rng.gen_range(-scale..scale)).collect())
            .collect();
        self.b1 = vec![0.0; hidden];
        let hscale = (1.0 / hidden as f64).sqrt();
        self.w2 = (0..hidden).map(|_| rng.gen_range(-hscale..hscale)).collect();
        self.b2 = 0.0;

        let lr = self.config.learning_rate;
        for _ in 0..self.config.epochs {
            let mut gw1 = vec![vec![0.0; dims]; hidden];
            let mut gb1 = vec![0.0; hidden];
            let mut gw2 = vec![0.0; hidden];
            let mut gb2 = 0.0;

            for i in 0..n {
                let (h, p) = self.forward(&z[i]);
                let err = p - y[i] as f64;
                gb2 += err;
                for k in 0..hidden {
                    gw2[k] += err * h[k];
                    // backprop through tanh
                    let dh = err * self.w2[k] * (1.0 - h[k] * h[k]);
                    gb1[k] += dh;
                    for j in 0..dims {
                        gw1[k][j] += dh * z[i][j];
                    }
                }
            }

            let inv_n = 1.0 / n as f64;
            for k in 0..hidden {
                self.w2[k] -= lr * gw2[k] * inv_n;
                self.b1[k] -= lr * gb1[k] * inv_n;
                for j in 0..dims {
                    self.w1[k][j] -= lr * gw1[k][j] * inv_n;
                }
            }
            self.b2 -= lr * gb2 * inv_n;
        }
        Ok(())
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        if self.w1.is_empty() {
            return 0.5;
        }
        let z = self.standardize(row);
        self.forward(&z).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let jitter = (i % 6) as f64 * 0.05;
            if i % 2 == 0 {
                x.push(vec![2.0 + jitter, -1.0]);
                y.push(1);
            } else {
                x.push(vec![-2.0 - jitter, 1.0]);
                y.push(0);
            }
        }
        (x, y)
    }

    #[test]
    fn test_learns_signal() {
        let (x, y) = dataset();
        let mut model = MlpClassifier::new(MlpConfig::default(), 42);
        model.fit(&x, &y).unwrap();
        assert!(model.predict_probability(&[2.5, -1.0]) > 0.7);
        assert!(model.predict_probability(&[-2.5, 1.0]) < 0.3);
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let (x, y) = dataset();
        let mut a = MlpClassifier::new(MlpConfig::default(), 99);
        let mut b = MlpClassifier::new(MlpConfig::default(), 99);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        let row = [1.0, 0.5];
        assert_eq!(a.predict_probability(&row), b.predict_probability(&row));
    }

    #[test]
    fn test_untrained_model_returns_neutral_probability() {
        let model = MlpClassifier::new(MlpConfig::default(), 1);
        assert_eq!(model.predict_probability(&[1.0, 2.0]), 0.5);
    }
}
