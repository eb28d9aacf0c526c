use std::collections::BTreeMap;

use crate::selection::traits::WordModel;
use crate::types::{FeatureMatrix, Recognition, ScoreTable};

/// Scores test sequences against every word model and guesses the most
/// likely word per sequence.
pub struct Recognizer {
    models: BTreeMap<String, Box<dyn WordModel>>,
}

impl Recognizer {
    pub fn new(models: BTreeMap<String, Box<dyn WordModel>>) -> Self {
        Self { models }
    }

    /// Build from per-word selection results; words whose selection came up
    /// empty are left out of the vocabulary rather than failing.
    pub fn from_selection(
        results: impl IntoIterator<Item = (String, Option<Box<dyn WordModel>>)>,
    ) -> Self {
        let models = results
            .into_iter()
            .filter_map(|(word, model)| model.map(|m| (word, m)))
            .collect();
        Self::new(models)
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.models.len()
    }

    /// Score every test item against every model, in test-item order.
    ///
    /// A model that fails to score an item gets the negative-infinity
    /// sentinel in that item's table and is never that item's guess; an
    /// item every model fails on gets a `None` guess.
    pub fn recognize(&self, test_items: &[FeatureMatrix]) -> Recognition {
        let mut score_tables = Vec::with_capacity(test_items.len());
        let mut guesses = Vec::with_capacity(test_items.len());

        for item in test_items {
            let mut table = ScoreTable::new();
            let mut best_score = f64::NEG_INFINITY;
            let mut best_guess: Option<String> = None;

            for (word, model) in &self.models {
                match model.score(item) {
                    Ok(score) => {
                        table.insert(word.clone(), score);
                        if score > best_score {
                            best_score = score;
                            best_guess = Some(word.clone());
                        }
                    }
                    Err(err) => {
                        tracing::debug!(word = word.as_str(), %err, "model failed to score test item");
                        table.insert(word.clone(), f64::NEG_INFINITY);
                    }
                }
            }

            score_tables.push(table);
            guesses.push(best_guess);
        }

        Recognition {
            score_tables,
            guesses,
        }
    }
}
