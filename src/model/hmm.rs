use ndarray::{Array1, Array2, ArrayView2};

use crate::error::RecognitionError;
use crate::model::gaussian::DiagGaussian;
use crate::types::FeatureMatrix;

const ROW_SUM_TOL: f64 = 1e-6;

/// Gaussian-emission hidden Markov model.
///
/// Probabilities are kept in log space for scoring; `start` and
/// `transitions` are stored as given (rows summing to one) with the log
/// variants cached at construction.
#[derive(Debug, Clone)]
pub struct GaussianHmm {
    start: Array1<f64>,
    transitions: Array2<f64>,
    states: Vec<DiagGaussian>,
    log_start: Array1<f64>,
    log_transitions: Array2<f64>,
}

impl GaussianHmm {
    pub fn new(
        start: Array1<f64>,
        transitions: Array2<f64>,
        states: Vec<DiagGaussian>,
    ) -> Result<Self, RecognitionError> {
        let n = states.len();
        if n == 0 {
            return Err(RecognitionError::invalid_input(
                "model needs at least one state",
            ));
        }
        if start.len() != n || transitions.nrows() != n || transitions.ncols() != n {
            return Err(RecognitionError::invalid_input(format!(
                "start/transition shapes do not match {n} states"
            )));
        }
        let dim = states[0].dim();
        if states.iter().any(|g| g.dim() != dim) {
            return Err(RecognitionError::invalid_input(
                "emission dimensions differ across states",
            ));
        }
        if start
            .iter()
            .chain(transitions.iter())
            .any(|&p| !p.is_finite() || p < 0.0)
        {
            return Err(RecognitionError::invalid_input(
                "probabilities must be finite and non-negative",
            ));
        }
        if (start.sum() - 1.0).abs() > ROW_SUM_TOL {
            return Err(RecognitionError::invalid_input(
                "start probabilities must sum to 1",
            ));
        }
        for row in transitions.rows() {
            if (row.sum() - 1.0).abs() > ROW_SUM_TOL {
                return Err(RecognitionError::invalid_input(
                    "transition rows must sum to 1",
                ));
            }
        }
        let log_start = start.mapv(f64::ln);
        let log_transitions = transitions.mapv(f64::ln);
        Ok(Self {
            start,
            transitions,
            states,
            log_start,
            log_transitions,
        })
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    pub fn n_features(&self) -> usize {
        self.states[0].dim()
    }

    pub fn start(&self) -> &Array1<f64> {
        &self.start
    }

    pub fn transitions(&self) -> &Array2<f64> {
        &self.transitions
    }

    pub fn states(&self) -> &[DiagGaussian] {
        &self.states
    }

    pub(crate) fn log_start(&self) -> &Array1<f64> {
        &self.log_start
    }

    pub(crate) fn log_transitions(&self) -> &Array2<f64> {
        &self.log_transitions
    }

    /// Total log-likelihood of a feature matrix: the forward algorithm run
    /// on each sequence segment independently, summed over segments.
    pub fn score(&self, features: &FeatureMatrix) -> Result<f64, RecognitionError> {
        if features.n_features() != self.n_features() {
            return Err(RecognitionError::invalid_input(format!(
                "model expects {} features, matrix has {}",
                self.n_features(),
                features.n_features()
            )));
        }
        let mut total = 0.0;
        for segment in features.segments() {
            total += self.score_segment(segment)?;
        }
        Ok(total)
    }

    fn score_segment(&self, frames: ArrayView2<'_, f64>) -> Result<f64, RecognitionError> {
        let n = self.n_states();
        let mut alpha = vec![0.0f64; n];
        let mut next = vec![0.0f64; n];

        for (j, state) in self.states.iter().enumerate() {
            alpha[j] = self.log_start[j] + state.log_pdf(frames.row(0));
        }

        for t in 1..frames.nrows() {
            let frame = frames.row(t);
            for (j, state) in self.states.iter().enumerate() {
                let reach = (0..n).map(|i| alpha[i] + self.log_transitions[[i, j]]);
                next[j] = log_sum_exp(reach) + state.log_pdf(frame);
            }
            std::mem::swap(&mut alpha, &mut next);
        }

        let log_l = log_sum_exp(alpha.iter().copied());
        if !log_l.is_finite() {
            return Err(RecognitionError::score(
                "forward pass",
                "sequence has zero probability under the model",
            ));
        }
        Ok(log_l)
    }
}

impl crate::selection::traits::WordModel for GaussianHmm {
    fn score(&self, features: &FeatureMatrix) -> Result<f64, RecognitionError> {
        GaussianHmm::score(self, features)
    }

    fn n_states(&self) -> usize {
        GaussianHmm::n_states(self)
    }

    fn n_features(&self) -> usize {
        GaussianHmm::n_features(self)
    }
}

pub(crate) fn log_sum_exp(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}
