// ============================================================
// Layer 3 — LossHistory Domain Type
// ============================================================
// Paired training / validation losses recorded every N
// batches during training. Purely for monitoring: nothing in
// the training loop reads it back.

use serde::{Deserialize, Serialize};

/// One validation checkpoint inside the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossReport {
    pub epoch:      usize,
    pub batch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    train:      Vec<f64>,
    validation: Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one (train, validation) pair. Both sequences always
    /// grow together so index i in one matches index i in the other.
    pub fn record(&mut self, train_loss: f64, val_loss: f64) {
        self.train.push(train_loss);
        self.validation.push(val_loss);
    }

    pub fn train_losses(&self) -> &[f64] {
        &self.train
    }

    pub fn validation_losses(&self) -> &[f64] {
        &self.validation
    }

    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.train.last()?, *self.validation.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_stay_aligned() {
        let mut h = LossHistory::new();
        assert!(h.is_empty());
        assert_eq!(h.last(), None);

        h.record(0.5, 0.6);
        h.record(0.25, 0.3);

        assert_eq!(h.len(), 2);
        assert_eq!(h.train_losses(), &[0.5, 0.25]);
        assert_eq!(h.validation_losses(), &[0.6, 0.3]);
        assert_eq!(h.last(), Some((0.25, 0.3)));
    }
}
