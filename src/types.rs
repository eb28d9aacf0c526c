use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::RecognitionError;

/// Concatenated feature frames for one or more sequences.
///
/// Rows are frames; `lengths` gives each sequence's frame count, in order,
/// and always sums to the row count.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f64>,
    lengths: Vec<usize>,
}

impl FeatureMatrix {
    pub fn new(data: Array2<f64>, lengths: Vec<usize>) -> Result<Self, RecognitionError> {
        if lengths.is_empty() {
            return Err(RecognitionError::invalid_input(
                "feature matrix needs at least one sequence",
            ));
        }
        if lengths.iter().any(|&len| len == 0) {
            return Err(RecognitionError::invalid_input(
                "zero-length sequence in feature matrix",
            ));
        }
        let total: usize = lengths.iter().sum();
        if total != data.nrows() {
            return Err(RecognitionError::invalid_input(format!(
                "sequence lengths sum to {total} but matrix has {} rows",
                data.nrows()
            )));
        }
        Ok(Self { data, lengths })
    }

    /// Single-sequence matrix: every row belongs to one sequence.
    pub fn from_single(data: Array2<f64>) -> Result<Self, RecognitionError> {
        let rows = data.nrows();
        Self::new(data, vec![rows])
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn n_frames(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// Iterate over the per-sequence row blocks.
    pub fn segments(&self) -> impl Iterator<Item = ArrayView2<'_, f64>> {
        let mut offset = 0usize;
        self.lengths.iter().map(move |&len| {
            let view = self.data.slice(ndarray::s![offset..offset + len, ..]);
            offset += len;
            view
        })
    }
}

/// Concatenate the sequences picked out by `indices` into one matrix.
///
/// This is the fold-assembly helper for cross-validation: sequences are
/// stacked in index order and their lengths recorded alongside.
pub fn combine_sequences(
    indices: &[usize],
    sequences: &[Array2<f64>],
) -> Result<FeatureMatrix, RecognitionError> {
    if indices.is_empty() {
        return Err(RecognitionError::invalid_input(
            "cannot combine an empty index set",
        ));
    }
    let mut views = Vec::with_capacity(indices.len());
    let mut lengths = Vec::with_capacity(indices.len());
    for &idx in indices {
        let seq = sequences.get(idx).ok_or_else(|| {
            RecognitionError::invalid_input(format!(
                "sequence index {idx} out of bounds ({} sequences)",
                sequences.len()
            ))
        })?;
        views.push(seq.view());
        lengths.push(seq.nrows());
    }
    let data = ndarray::concatenate(Axis(0), &views)
        .map_err(|e| RecognitionError::invalid_input(format!("mismatched feature widths: {e}")))?;
    FeatureMatrix::new(data, lengths)
}

/// Per-word training corpus handed to the selectors.
///
/// `BTreeMap` keeps vocabulary iteration deterministic, which matters for
/// reproducible selection and recognition output.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    sequences: BTreeMap<String, Vec<Array2<f64>>>,
    features: BTreeMap<String, FeatureMatrix>,
}

impl TrainingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one word's raw sequences; the combined matrix is built here
    /// so selectors never re-concatenate.
    pub fn insert_word(
        &mut self,
        word: impl Into<String>,
        sequences: Vec<Array2<f64>>,
    ) -> Result<(), RecognitionError> {
        let word = word.into();
        let indices: Vec<usize> = (0..sequences.len()).collect();
        let combined = combine_sequences(&indices, &sequences)?;
        self.sequences.insert(word.clone(), sequences);
        self.features.insert(word, combined);
        Ok(())
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn sequences(&self, word: &str) -> Option<&[Array2<f64>]> {
        self.sequences.get(word).map(Vec::as_slice)
    }

    pub fn features(&self, word: &str) -> Option<&FeatureMatrix> {
        self.features.get(word)
    }

    pub fn all_features(&self) -> &BTreeMap<String, FeatureMatrix> {
        &self.features
    }

    pub fn vocabulary_size(&self) -> usize {
        self.features.len()
    }
}

/// Word to log-likelihood map for one test item. Failed scores are recorded
/// as `f64::NEG_INFINITY`.
pub type ScoreTable = BTreeMap<String, f64>;

/// Recognition output: one score table and one best-guess word per test
/// item, both in test-item order.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub score_tables: Vec<ScoreTable>,
    pub guesses: Vec<Option<String>>,
}
