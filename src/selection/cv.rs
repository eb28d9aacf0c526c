//! Cross-validation selection: mean held-out log-likelihood over a fixed
//! 2-fold split of the word's own sequences, maximized. The winning state
//! count is then refit on the full word data; the fold models themselves
//! are never deployed.

use super::folds::two_fold_splits;
use super::traits::WordModel;
use super::Selector;
use crate::error::RecognitionError;
use crate::types::{combine_sequences, TrainingData};

pub(crate) fn search(
    selector: &Selector,
    word: &str,
    data: &TrainingData,
) -> Result<Option<Box<dyn WordModel>>, RecognitionError> {
    let sequences = data.sequences(word).ok_or_else(|| {
        RecognitionError::invalid_input(format!("word {word:?} not in training data"))
    })?;
    if sequences.len() < 2 {
        return Err(RecognitionError::insufficient_data(format!(
            "cross-validation needs at least 2 sequences, word {word:?} has {}",
            sequences.len()
        )));
    }

    let splits = two_fold_splits(sequences.len());
    let mut best: Option<(f64, usize)> = None;

    'candidates: for n_states in selector.candidate_range() {
        let mut fold_total = 0.0;
        for (train_idx, test_idx) in &splits {
            let held_out = match fold_score(selector, word, sequences, train_idx, test_idx, n_states)
            {
                Ok(score) => score,
                Err(err) => {
                    tracing::debug!(word, states = n_states, %err, "fold evaluation failed");
                    continue 'candidates;
                }
            };
            fold_total += held_out;
        }
        let mean = fold_total / splits.len() as f64;
        // strict greater-than: the first maximum wins on ties
        if best.as_ref().is_none_or(|(b, _)| mean > *b) {
            best = Some((mean, n_states));
        }
    }

    let Some((_, best_states)) = best else {
        return Ok(None);
    };

    // the fold scores only picked the complexity; deploy a model fit on the
    // entire word data
    let features = data.features(word).ok_or_else(|| {
        RecognitionError::invalid_input(format!("word {word:?} not in training data"))
    })?;
    Ok(selector.fit_candidate(word, features, best_states))
}

fn fold_score(
    selector: &Selector,
    word: &str,
    sequences: &[ndarray::Array2<f64>],
    train_idx: &[usize],
    test_idx: &[usize],
    n_states: usize,
) -> Result<f64, RecognitionError> {
    let train = combine_sequences(train_idx, sequences)?;
    let test = combine_sequences(test_idx, sequences)?;
    let model = selector
        .trainer()
        .fit(&train, n_states, selector.config().random_seed)?;
    model.score(&test)
}
