// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Partitions the row indices of a feature matrix into two
// disjoint sets:
//   - Validation set: held out, used only to report loss
//   - Training set:   everything else, fed to the optimiser
//
// The split is a seeded permutation, so the same
// (row_count, fraction, seed) always gives the same partition:
//
//   permutation = shuffle(0..row_count, StdRng(seed))
//   validation  = permutation[..floor(fraction * row_count)]
//   training    = permutation[floor(fraction * row_count)..]
//
// Training order does not matter downstream: the data loader
// reshuffles every epoch.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom
//
// Reference: rand crate documentation (StdRng, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{EmbedError, Result};

/// Row indices of one train/validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub validation: Vec<usize>,
    pub training:   Vec<usize>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.validation.len() + self.training.len()
    }
}

/// Deterministically split `0..row_count` into (validation, training).
///
/// # Arguments
/// * `row_count`           - Number of rows, must be > 0
/// * `validation_fraction` - In [0, 1); 0 gives an empty validation set
/// * `seed`                - Reusing a seed reproduces the split exactly
///
/// # Example
/// ```
/// use catalog_embed::data::splitter::split;
/// let p = split(100, 0.2, 0).unwrap();
/// assert_eq!(p.validation.len(), 20);
/// assert_eq!(p.training.len(), 80);
/// ```
pub fn split(row_count: usize, validation_fraction: f64, seed: u64) -> Result<Partition> {
    if row_count == 0 {
        return Err(EmbedError::config("cannot split an empty feature matrix"));
    }
    if !(0.0..1.0).contains(&validation_fraction) {
        return Err(EmbedError::config(format!(
            "validation fraction must be in [0, 1), got {validation_fraction}"
        )));
    }

    let mut permutation: Vec<usize> = (0..row_count).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    // floor, not round: 0.2 * 10 rows must give exactly 2
    let n_val = (validation_fraction * row_count as f64).floor() as usize;

    // split_off(n) leaves [0..n] in place and returns [n..]
    let training = permutation.split_off(n_val);

    tracing::debug!(
        "Partition: {} validation, {} training (seed={})",
        permutation.len(),
        training.len(),
        seed,
    );

    Ok(Partition { validation: permutation, training })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let p = split(100, 0.2, 0).unwrap();
        assert_eq!(p.validation.len(), 20);
        assert_eq!(p.training.len(), 80);
    }

    #[test]
    fn test_same_seed_same_partition() {
        assert_eq!(split(100, 0.2, 0).unwrap(), split(100, 0.2, 0).unwrap());
    }

    #[test]
    fn test_disjoint_and_complete() {
        let p = split(100, 0.2, 0).unwrap();
        let val: HashSet<usize>   = p.validation.iter().copied().collect();
        let train: HashSet<usize> = p.training.iter().copied().collect();
        assert!(val.is_disjoint(&train));

        let all: HashSet<usize> = val.union(&train).copied().collect();
        assert_eq!(all, (0..100).collect::<HashSet<_>>());
        assert_eq!(p.total(), 100);
    }

    #[test]
    fn test_small_matrix_uses_floor() {
        let p = split(10, 0.2, 0).unwrap();
        assert_eq!(p.validation.len(), 2);
        assert_eq!(p.training.len(), 8);

        // 0.25 * 10 = 2.5 → 2, never rounded up
        assert_eq!(split(10, 0.25, 0).unwrap().validation.len(), 2);
    }

    #[test]
    fn test_zero_fraction_gives_empty_validation() {
        let p = split(10, 0.0, 3).unwrap();
        assert!(p.validation.is_empty());
        assert_eq!(p.training.len(), 10);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(split(0, 0.2, 0).unwrap_err().is_configuration());
        assert!(split(10, 1.0, 0).unwrap_err().is_configuration());
        assert!(split(10, -0.1, 0).unwrap_err().is_configuration());
        assert!(split(10, f64::NAN, 0).unwrap_err().is_configuration());
    }
}
