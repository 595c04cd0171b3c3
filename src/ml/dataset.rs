//! Seeded train/held-out partitioning and evaluation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::Label;

/// Training and held-out partitions of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffle `items` with `seed` and hold out `ceil(n * test_size)` of them.
///
/// `test_size` is clamped to [0, 1]. The same inputs always give the same
/// partitions.
pub fn train_test_split<T: Clone>(items: &[T], test_size: f64, seed: u64) -> DatasetSplit<T> {
    let n = items.len();
    let n_test = ((n as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let (test_idx, train_idx) = order.split_at(n_test);
    DatasetSplit {
        train: train_idx.iter().map(|&i| items[i].clone()).collect(),
        test: test_idx.iter().map(|&i| items[i].clone()).collect(),
    }
}

/// Fraction of positions where `predicted` matches `actual` (0.0 for empty input)
pub fn accuracy(predicted: &[Label], actual: &[Label]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / n as f64
}
