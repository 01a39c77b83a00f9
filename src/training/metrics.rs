//! Binary classification diagnostics recorded per fold and for the final
//! ensemble: F1, accuracy, ROC-AUC.

/// F1 over binary predictions obtained by thresholding probabilities at 0.5.
pub fn f1_score(y_true: &[u8], probs: &[f64]) -> f64 {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for (&t, &p) in y_true.iter().zip(probs) {
        let pred = if p > 0.5 { 1 } else { 0 };
        match (t, pred) {
            (1, 1) => tp += 1.0,
            (0, 1) => fp += 1.0,
            (1, 0) => fn_ += 1.0,
            _ => {}
        }
    }
    let denom = 2.0 * tp + fp + fn_;
    if denom == 0.0 {
        0.0
    } else {
        2.0 * tp / denom
    }
}

pub fn accuracy(y_true: &[u8], probs: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(probs)
        .filter(|(&t, &p)| (p > 0.5) == (t == 1))
        .count();
    correct as f64 / y_true.len() as f64
}

/// ROC-AUC via the rank statistic (Mann-Whitney U), ties averaged.
pub fn roc_auc(y_true: &[u8], probs: &[f64]) -> f64 {
    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[a].partial_cmp(&probs[b]).unwrap_or(std::cmp::Ordering::Equal));

    // Average ranks across ties.
    let mut ranks = vec![0.0; probs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && probs[order[j + 1]] == probs[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();

    (rank_sum_pos - n_pos as f64 * (n_pos as f64 + 1.0) / 2.0) / (n_pos as f64 * n_neg as f64)
}
