use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::error::RecognitionError;

/// Variances below this are clamped so a constant feature column cannot
/// produce an infinite density.
pub(crate) const VAR_FLOOR: f64 = 1e-3;

/// Diagonal-covariance Gaussian emission distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagGaussian {
    mean: Array1<f64>,
    var: Array1<f64>,
    /// Cached `sum(ln var_j) + d * ln(2*pi)` term of the log density.
    log_norm: f64,
}

impl DiagGaussian {
    pub fn new(mean: Array1<f64>, var: Array1<f64>) -> Result<Self, RecognitionError> {
        if mean.len() != var.len() {
            return Err(RecognitionError::invalid_input(format!(
                "mean has {} dims but variance has {}",
                mean.len(),
                var.len()
            )));
        }
        if mean.is_empty() {
            return Err(RecognitionError::invalid_input(
                "gaussian needs at least one dimension",
            ));
        }
        let var = var.mapv(|v| v.max(VAR_FLOOR));
        if mean.iter().chain(var.iter()).any(|x| !x.is_finite()) {
            return Err(RecognitionError::fit(
                "estimating emission density",
                "non-finite mean or variance",
            ));
        }
        let d = mean.len() as f64;
        let log_norm = var.iter().map(|v| v.ln()).sum::<f64>() + d * (2.0 * PI).ln();
        Ok(Self {
            mean,
            var,
            log_norm,
        })
    }

    /// Moment estimates from a pooled set of frames.
    pub fn from_frames(frames: ArrayView2<'_, f64>) -> Result<Self, RecognitionError> {
        if frames.nrows() == 0 {
            return Err(RecognitionError::fit(
                "estimating emission density",
                "no frames assigned to state",
            ));
        }
        let mean = frames
            .mean_axis(Axis(0))
            .ok_or_else(|| RecognitionError::fit("estimating emission density", "empty frames"))?;
        let n = frames.nrows() as f64;
        let mut var = Array1::zeros(frames.ncols());
        for row in frames.rows() {
            for (j, &x) in row.iter().enumerate() {
                let d = x - mean[j];
                var[j] += d * d;
            }
        }
        var /= n;
        Self::new(mean, var)
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn var(&self) -> &Array1<f64> {
        &self.var
    }

    /// Log density of one frame.
    pub fn log_pdf(&self, frame: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(frame.len(), self.mean.len());
        let mut quad = 0.0;
        for j in 0..self.mean.len() {
            let d = frame[j] - self.mean[j];
            quad += d * d / self.var[j];
        }
        -0.5 * (self.log_norm + quad)
    }
}
