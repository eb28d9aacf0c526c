//! Fixed 2-fold consecutive split of a word's sequences: first-half and
//! second-half index blocks, each used once as the held-out fold. The first
//! block takes the extra sequence when the count is odd.

/// `(train_indices, test_indices)` pairs for a 2-fold split of `n`
/// sequences. Callers must ensure `n >= 2` so both folds are non-empty.
pub(crate) fn two_fold_splits(n: usize) -> [(Vec<usize>, Vec<usize>); 2] {
    debug_assert!(n >= 2, "2-fold split needs at least 2 sequences");
    let mid = n.div_ceil(2);
    let first: Vec<usize> = (0..mid).collect();
    let second: Vec<usize> = (mid..n).collect();
    [(second.clone(), first.clone()), (first, second)]
}
