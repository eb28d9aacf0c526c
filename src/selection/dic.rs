//! Discriminative Information Criterion selection:
//! `logL(word) - mean(logL(other))` over every other vocabulary word,
//! maximized. Favors models that fit their own word well while fitting the
//! rest of the vocabulary poorly.

use super::traits::WordModel;
use super::Selector;
use crate::error::RecognitionError;
use crate::types::{FeatureMatrix, TrainingData};

pub(crate) fn search(
    selector: &Selector,
    word: &str,
    features: &FeatureMatrix,
    data: &TrainingData,
) -> Result<Option<Box<dyn WordModel>>, RecognitionError> {
    if data.vocabulary_size() < 2 {
        return Err(RecognitionError::insufficient_data(
            "DIC needs at least two vocabulary words to contrast against",
        ));
    }

    let mut best: Option<(f64, Box<dyn WordModel>)> = None;

    'candidates: for n_states in selector.candidate_range() {
        let Some(model) = selector.fit_candidate(word, features, n_states) else {
            continue;
        };
        let own = match model.score(features) {
            Ok(score) => score,
            Err(err) => {
                tracing::debug!(word, states = n_states, %err, "candidate scoring failed");
                continue;
            }
        };

        let mut cross_total = 0.0;
        let mut cross_count = 0usize;
        for (other, other_features) in data.all_features() {
            if other == word {
                continue;
            }
            match model.score(other_features) {
                Ok(score) => {
                    cross_total += score;
                    cross_count += 1;
                }
                Err(err) => {
                    tracing::debug!(
                        word,
                        other = other.as_str(),
                        states = n_states,
                        %err,
                        "cross-word scoring failed"
                    );
                    continue 'candidates;
                }
            }
        }

        let score = own - cross_total / cross_count as f64;
        // strict greater-than: the first maximum wins on ties
        if best.as_ref().is_none_or(|(b, _)| score > *b) {
            best = Some((score, model));
        }
    }

    Ok(best.map(|(_, model)| model))
}
