use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One cross-validation fold: disjoint train/validation index sets.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified k-fold split preserving the positive/negative ratio.
///
/// Positive and negative indices are shuffled with a seeded RNG and dealt
/// round-robin into k validation buckets, so every sample lands in exactly
/// one validation set and the split is reproducible for a given seed.
pub fn stratified_kfold(labels: &[u8], k: usize, seed: u64) -> Vec<Fold> {
    let k = k.max(2);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut positives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == 1).collect();
    let mut negatives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] != 1).collect();
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, idx) in positives.iter().chain(negatives.iter()).enumerate() {
        buckets[i % k].push(*idx);
    }

    (0..k)
        .map(|f| {
            let mut validation = buckets[f].clone();
            validation.sort_unstable();
            let mut train: Vec<usize> = buckets
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != f)
                .flat_map(|(_, b)| b.iter().copied())
                .collect();
            train.sort_unstable();
            Fold { train, validation }
        })
        .collect()
}
