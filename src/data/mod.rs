//! Batch types and data loading.

use ndarray::{Array2, Array3};

use crate::text::PAD_ID;

/// A fully labeled batch: the supervised training path and every evaluation
/// pass consume these.
#[derive(Debug, Clone)]
pub struct LabeledBatch {
    /// (batch, time, mel) feature tensor, zero-padded along time.
    pub features: Array3<f32>,
    pub feature_lengths: Vec<usize>,
    /// Integer-encoded transcripts, padded to the batch maximum.
    pub targets: Array2<i64>,
    pub target_lengths: Vec<usize>,
}

impl LabeledBatch {
    pub fn new(
        features: Array3<f32>,
        feature_lengths: Vec<usize>,
        targets: Array2<i64>,
        target_lengths: Vec<usize>,
    ) -> Self {
        Self { features, feature_lengths, targets, target_lengths }
    }

    /// Number of examples in the batch.
    pub fn size(&self) -> usize {
        self.feature_lengths.len()
    }
}

/// A distillation batch: unlabeled features plus gold transcripts for a
/// held-out subset of rows.
#[derive(Debug, Clone)]
pub struct DistillBatch {
    pub features: Array3<f32>,
    pub feature_lengths: Vec<usize>,
    /// (batch-local row, ground-truth transcript) pairs. Each pair replaces
    /// the teacher's pseudo-label at that row before the student trains.
    pub overrides: Vec<(usize, String)>,
}

impl DistillBatch {
    pub fn new(
        features: Array3<f32>,
        feature_lengths: Vec<usize>,
        overrides: Vec<(usize, String)>,
    ) -> Self {
        Self { features, feature_lengths, overrides }
    }

    pub fn size(&self) -> usize {
        self.feature_lengths.len()
    }
}

/// Pad integer-encoded targets to the batch maximum with [`PAD_ID`],
/// returning the padded array alongside the true lengths.
pub fn pad_targets(targets: &[Vec<i64>]) -> (Array2<i64>, Vec<usize>) {
    let max_len = targets.iter().map(Vec::len).max().unwrap_or(0);
    let mut padded = Array2::from_elem((targets.len(), max_len), PAD_ID);
    for (row, ids) in targets.iter().enumerate() {
        for (col, &id) in ids.iter().enumerate() {
            padded[[row, col]] = id;
        }
    }
    let lengths = targets.iter().map(Vec::len).collect();
    (padded, lengths)
}

/// A finite, restartable batch source.
///
/// `len` is the batch count; one-cycle schedules are sized from it before
/// training starts, so it must agree with what `iter` yields.
pub trait DataLoader<T> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh pass over the batches. Each call restarts from the beginning.
    fn iter(&self) -> Box<dyn Iterator<Item = T> + '_>;
}

/// Vec-backed loader.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader<T> {
    batches: Vec<T>,
}

impl<T: Clone> InMemoryLoader<T> {
    pub fn new(batches: Vec<T>) -> Self {
        Self { batches }
    }
}

impl<T: Clone> DataLoader<T> for InMemoryLoader<T> {
    fn len(&self) -> usize {
        self.batches.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.batches.iter().cloned())
    }
}
