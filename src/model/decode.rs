use ndarray::ArrayView2;

use crate::error::RecognitionError;
use crate::model::hmm::GaussianHmm;

/// Log-space Viterbi decode of one sequence segment.
///
/// Returns the most likely state per frame and the path log-probability.
/// Used by the segmental trainer to re-assign frames between iterations.
pub fn viterbi_path(
    model: &GaussianHmm,
    frames: ArrayView2<'_, f64>,
) -> Result<(Vec<usize>, f64), RecognitionError> {
    let t_len = frames.nrows();
    let n = model.n_states();
    if t_len == 0 {
        return Err(RecognitionError::invalid_input(
            "cannot decode an empty segment",
        ));
    }
    if frames.ncols() != model.n_features() {
        return Err(RecognitionError::invalid_input(format!(
            "model expects {} features, segment has {}",
            model.n_features(),
            frames.ncols()
        )));
    }

    let log_start = model.log_start();
    let log_trans = model.log_transitions();

    let mut prev = vec![f64::NEG_INFINITY; n];
    let mut curr = vec![f64::NEG_INFINITY; n];
    let mut bp = vec![0usize; t_len * n];

    for (j, state) in model.states().iter().enumerate() {
        prev[j] = log_start[j] + state.log_pdf(frames.row(0));
    }

    for t in 1..t_len {
        let frame = frames.row(t);
        let bp_offset = t * n;
        for (j, state) in model.states().iter().enumerate() {
            let mut best = f64::NEG_INFINITY;
            let mut best_state = 0usize;
            for i in 0..n {
                let val = prev[i] + log_trans[[i, j]];
                if val > best {
                    best = val;
                    best_state = i;
                }
            }
            curr[j] = best + state.log_pdf(frame);
            bp[bp_offset + j] = best_state;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let mut best_final = f64::NEG_INFINITY;
    let mut best_state = 0usize;
    for (j, &val) in prev.iter().enumerate() {
        if val > best_final {
            best_final = val;
            best_state = j;
        }
    }
    if !best_final.is_finite() {
        return Err(RecognitionError::score(
            "viterbi decode",
            "no finite-probability state path",
        ));
    }

    let mut path = vec![0usize; t_len];
    path[t_len - 1] = best_state;
    for t in (0..t_len - 1).rev() {
        path[t] = bp[(t + 1) * n + path[t + 1]];
    }
    Ok((path, best_final))
}
