pub mod bic;
pub mod cv;
pub mod dic;
pub mod folds;
pub mod traits;

use std::ops::RangeInclusive;

use crate::config::SelectorConfig;
use crate::error::RecognitionError;
use crate::model::trainer::SegmentalTrainer;
use crate::types::{FeatureMatrix, TrainingData};

use self::traits::{ModelTrainer, WordModel};

/// The closed set of selection strategies, dispatched by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Always fit at the configured constant state count; no search.
    Constant,
    /// Bayesian Information Criterion, minimized over the search range.
    Bic,
    /// Discriminative Information Criterion, maximized over the search range.
    Dic,
    /// Mean held-out log-likelihood over a fixed 2-fold split, maximized.
    CrossValidation,
}

/// Per-word model selection over a range of candidate state counts.
pub struct Selector {
    config: SelectorConfig,
    trainer: Box<dyn ModelTrainer>,
}

impl Selector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            trainer: Box::new(SegmentalTrainer::new()),
        }
    }

    pub fn with_trainer(mut self, trainer: Box<dyn ModelTrainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Pick the best model for `word` under `criterion`.
    ///
    /// Candidate fit/score failures are skipped; an exhausted search falls
    /// back to the constant-state fit, and `Ok(None)` means even the
    /// fallback could not be trained. Errors are reserved for degenerate
    /// requests: an unknown word, DIC over a single-word vocabulary, or
    /// cross-validation with fewer than two sequences.
    pub fn select(
        &self,
        word: &str,
        data: &TrainingData,
        criterion: Criterion,
    ) -> Result<Option<Box<dyn WordModel>>, RecognitionError> {
        self.config.validate()?;
        let features = data.features(word).ok_or_else(|| {
            RecognitionError::invalid_input(format!("word {word:?} not in training data"))
        })?;

        let chosen = match criterion {
            Criterion::Constant => return Ok(self.base_model(word, features)),
            Criterion::Bic => bic::search(self, word, features),
            Criterion::Dic => dic::search(self, word, features, data)?,
            Criterion::CrossValidation => cv::search(self, word, data)?,
        };

        match chosen {
            Some(model) => Ok(Some(model)),
            None => {
                tracing::warn!(
                    word,
                    states = self.config.constant_states,
                    "selection search exhausted; falling back to constant-state fit"
                );
                Ok(self.base_model(word, features))
            }
        }
    }

    /// Fit at the constant/fallback state count; a failed fit yields `None`.
    pub(crate) fn base_model(
        &self,
        word: &str,
        features: &FeatureMatrix,
    ) -> Option<Box<dyn WordModel>> {
        self.fit_candidate(word, features, self.config.constant_states)
    }

    pub(crate) fn fit_candidate(
        &self,
        word: &str,
        features: &FeatureMatrix,
        n_states: usize,
    ) -> Option<Box<dyn WordModel>> {
        match self
            .trainer
            .fit(features, n_states, self.config.random_seed)
        {
            Ok(model) => Some(model),
            Err(err) if err.is_candidate_failure() => {
                tracing::debug!(word, states = n_states, %err, "candidate fit failed");
                None
            }
            Err(err) => {
                // not a fit failure: the trainer rejected the request itself
                tracing::warn!(word, states = n_states, %err, "trainer rejected fit request");
                None
            }
        }
    }

    pub(crate) fn trainer(&self) -> &dyn ModelTrainer {
        self.trainer.as_ref()
    }

    pub(crate) fn candidate_range(&self) -> RangeInclusive<usize> {
        self.config.min_states..=self.config.max_states
    }
}
