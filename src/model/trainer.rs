use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::RecognitionError;
use crate::model::decode::viterbi_path;
use crate::model::gaussian::DiagGaussian;
use crate::model::hmm::GaussianHmm;
use crate::selection::traits::{ModelTrainer, WordModel};
use crate::types::FeatureMatrix;

/// Add-delta smoothing on start/transition counts, so no probability is an
/// exact zero and cross-word scoring stays finite where the data allows.
const COUNT_SMOOTHING: f64 = 1e-3;
/// Scale of the seeded perturbation applied to flat-start means, relative to
/// each dimension's standard deviation.
const MEAN_JITTER: f64 = 1e-2;

/// Segmental trainer: flat-start uniform segmentation followed by rounds of
/// Viterbi re-segmentation and moment re-estimation, capped at `max_iters`.
#[derive(Debug, Clone)]
pub struct SegmentalTrainer {
    pub max_iters: usize,
    pub tol: f64,
}

impl Default for SegmentalTrainer {
    fn default() -> Self {
        Self {
            max_iters: 20,
            tol: 1e-4,
        }
    }
}

impl SegmentalTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit a Gaussian HMM with `n_states` hidden states.
    ///
    /// Fails when the data cannot populate every state or when decoding
    /// breaks down numerically; both are ordinary fit failures for callers.
    pub fn fit_hmm(
        &self,
        features: &FeatureMatrix,
        n_states: usize,
        seed: u64,
    ) -> Result<GaussianHmm, RecognitionError> {
        if n_states == 0 {
            return Err(RecognitionError::invalid_input(
                "cannot fit a model with zero states",
            ));
        }
        if features.n_frames() < n_states {
            return Err(RecognitionError::fit(
                "segmental flat start",
                format!(
                    "{} frames cannot populate {n_states} states",
                    features.n_frames()
                ),
            ));
        }

        let flat_paths: Vec<Vec<usize>> = features
            .segments()
            .map(|seg| uniform_path(seg.nrows(), n_states))
            .collect();
        let mut model = estimate(features, &flat_paths, n_states, Some(seed))?;

        let mut prev_log_p = f64::NEG_INFINITY;
        for _ in 0..self.max_iters {
            let mut total = 0.0;
            let mut paths = Vec::with_capacity(features.n_sequences());
            for seg in features.segments() {
                let (path, log_p) = viterbi_path(&model, seg)
                    .map_err(|e| RecognitionError::fit("segmental re-segmentation", e))?;
                total += log_p;
                paths.push(path);
            }
            if prev_log_p.is_finite() && total - prev_log_p < self.tol {
                break;
            }
            prev_log_p = total;
            match estimate(features, &paths, n_states, None) {
                Ok(next) => model = next,
                // A state lost all of its frames; the previous model stands.
                Err(_) => break,
            }
        }
        Ok(model)
    }
}

impl ModelTrainer for SegmentalTrainer {
    fn fit(
        &self,
        features: &FeatureMatrix,
        n_states: usize,
        seed: u64,
    ) -> Result<Box<dyn WordModel>, RecognitionError> {
        Ok(Box::new(self.fit_hmm(features, n_states, seed)?))
    }
}

/// Left-to-right uniform state assignment for one segment.
fn uniform_path(len: usize, n_states: usize) -> Vec<usize> {
    (0..len)
        .map(|t| (t * n_states / len).min(n_states - 1))
        .collect()
}

/// Re-estimate model parameters from hard per-frame state assignments.
fn estimate(
    features: &FeatureMatrix,
    paths: &[Vec<usize>],
    n_states: usize,
    jitter_seed: Option<u64>,
) -> Result<GaussianHmm, RecognitionError> {
    let mut state_rows: Vec<Vec<usize>> = vec![Vec::new(); n_states];
    let mut start_counts = vec![0.0f64; n_states];
    let mut trans_counts = Array2::<f64>::zeros((n_states, n_states));

    let mut offset = 0usize;
    for (path, &len) in paths.iter().zip(features.lengths()) {
        debug_assert_eq!(path.len(), len);
        start_counts[path[0]] += 1.0;
        for (t, &s) in path.iter().enumerate() {
            state_rows[s].push(offset + t);
            if t > 0 {
                trans_counts[[path[t - 1], s]] += 1.0;
            }
        }
        offset += len;
    }

    let mut rng = jitter_seed.map(StdRng::seed_from_u64);
    let mut states = Vec::with_capacity(n_states);
    for (s, rows) in state_rows.iter().enumerate() {
        if rows.is_empty() {
            return Err(RecognitionError::fit(
                "estimating state occupancy",
                format!("state {s} has no assigned frames"),
            ));
        }
        let pooled = features.data().select(Axis(0), rows);
        let gaussian = DiagGaussian::from_frames(pooled.view())?;
        let gaussian = match rng.as_mut() {
            Some(rng) => {
                let mut mean = gaussian.mean().clone();
                for (j, m) in mean.iter_mut().enumerate() {
                    *m += (rng.gen::<f64>() - 0.5) * MEAN_JITTER * gaussian.var()[j].sqrt();
                }
                DiagGaussian::new(mean, gaussian.var().clone())?
            }
            None => gaussian,
        };
        states.push(gaussian);
    }

    let start = normalize_counts(&Array1::from_vec(start_counts));
    let mut transitions = Array2::<f64>::zeros((n_states, n_states));
    for s in 0..n_states {
        let row = normalize_counts(&trans_counts.row(s).to_owned());
        transitions.row_mut(s).assign(&row);
    }

    GaussianHmm::new(start, transitions, states)
}

fn normalize_counts(counts: &Array1<f64>) -> Array1<f64> {
    let smoothed = counts.mapv(|c| c + COUNT_SMOOTHING);
    let total = smoothed.sum();
    smoothed / total
}

#[cfg(test)]
mod tests {
    use ndarray::{arr2, Array2};

    use super::*;

    fn two_phase_word(reps: usize) -> FeatureMatrix {
        // each sequence dwells near 0.0 then jumps to near 8.0
        let mut seqs = Vec::new();
        for r in 0..reps {
            let shift = r as f64 * 0.01;
            seqs.push(arr2(&[
                [0.0 + shift, 1.0],
                [0.2 + shift, 1.1],
                [0.1 + shift, 0.9],
                [8.0 + shift, 5.0],
                [8.2 + shift, 5.1],
                [7.9 + shift, 4.9],
            ]));
        }
        let indices: Vec<usize> = (0..seqs.len()).collect();
        crate::types::combine_sequences(&indices, &seqs).unwrap()
    }

    #[test]
    fn uniform_path_spreads_states_in_order() {
        assert_eq!(uniform_path(6, 3), vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(uniform_path(2, 2), vec![0, 1]);
        // fewer frames than states covers a prefix of the state chain
        assert_eq!(uniform_path(1, 3), vec![0]);
    }

    #[test]
    fn fit_produces_requested_state_count() {
        let features = two_phase_word(3);
        let trainer = SegmentalTrainer::new();
        let model = trainer.fit_hmm(&features, 2, 14).unwrap();
        assert_eq!(model.n_states(), 2);
        assert_eq!(model.n_features(), 2);
        assert!(model.score(&features).unwrap().is_finite());
    }

    #[test]
    fn fit_is_deterministic_for_a_fixed_seed() {
        let features = two_phase_word(3);
        let trainer = SegmentalTrainer::new();
        let a = trainer.fit_hmm(&features, 3, 14).unwrap();
        let b = trainer.fit_hmm(&features, 3, 14).unwrap();
        assert_eq!(a.score(&features).unwrap(), b.score(&features).unwrap());
        assert_eq!(a.start(), b.start());
        assert_eq!(a.transitions(), b.transitions());
    }

    #[test]
    fn fit_fails_with_fewer_frames_than_states() {
        let features = FeatureMatrix::from_single(arr2(&[[0.0, 0.0], [1.0, 1.0]])).unwrap();
        let trainer = SegmentalTrainer::new();
        let result = trainer.fit_hmm(&features, 5, 14);
        assert!(matches!(result, Err(RecognitionError::Fit { .. })));
    }

    #[test]
    fn fit_fails_when_a_state_gets_no_frames() {
        // three one-frame sequences: only state 0 is ever populated
        let data = Array2::from_shape_vec((3, 1), vec![0.0, 0.1, 0.2]).unwrap();
        let features = FeatureMatrix::new(data, vec![1, 1, 1]).unwrap();
        let trainer = SegmentalTrainer::new();
        let result = trainer.fit_hmm(&features, 3, 14);
        assert!(matches!(result, Err(RecognitionError::Fit { .. })));
    }

    #[test]
    fn separated_phases_land_in_distinct_states() {
        let features = two_phase_word(4);
        let trainer = SegmentalTrainer::new();
        let model = trainer.fit_hmm(&features, 2, 14).unwrap();
        let means: Vec<f64> = model.states().iter().map(|g| g.mean()[0]).collect();
        let spread = (means[0] - means[1]).abs();
        assert!(spread > 5.0, "state means too close: {means:?}");
    }
}
