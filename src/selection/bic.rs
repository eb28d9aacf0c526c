//! Bayesian Information Criterion selection: `-2 * logL + p * ln(N)`,
//! minimized over the candidate range. `p` counts the free transition and
//! diagonal-Gaussian emission parameters less one normalization constraint.

use super::traits::WordModel;
use super::Selector;
use crate::types::FeatureMatrix;

pub(crate) fn search(
    selector: &Selector,
    word: &str,
    features: &FeatureMatrix,
) -> Option<Box<dyn WordModel>> {
    let mut best: Option<(f64, Box<dyn WordModel>)> = None;

    for n_states in selector.candidate_range() {
        let Some(model) = selector.fit_candidate(word, features, n_states) else {
            continue;
        };
        let log_l = match model.score(features) {
            Ok(score) => score,
            Err(err) => {
                tracing::debug!(word, states = n_states, %err, "candidate scoring failed");
                continue;
            }
        };
        let score = bic_score(log_l, n_states, features.n_features(), features.n_frames());
        // strict less-than: the first minimum wins on ties
        if best.as_ref().is_none_or(|(b, _)| score < *b) {
            best = Some((score, model));
        }
    }

    best.map(|(_, model)| model)
}

pub(crate) fn free_parameters(n_states: usize, n_features: usize) -> usize {
    n_states * n_states + 2 * n_features * n_states - 1
}

pub(crate) fn bic_score(log_l: f64, n_states: usize, n_features: usize, n_frames: usize) -> f64 {
    let p = free_parameters(n_states, n_features) as f64;
    -2.0 * log_l + p * (n_frames as f64).ln()
}
