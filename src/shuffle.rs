use rand::{seq::SliceRandom, Rng};

use crate::error::QuizError;

/// Returns a uniformly shuffled copy of `items` (Fisher-Yates), leaving the input untouched
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Takes the first `n` elements of a shuffled copy, i.e. sampling without replacement
pub fn sample<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    n: usize,
    rng: &mut R,
) -> Result<Vec<T>, QuizError> {
    if n > items.len() {
        return Err(QuizError::InsufficientElements {
            requested: n,
            available: items.len(),
        });
    }

    let mut out = shuffle(items, rng);
    out.truncate(n);
    Ok(out)
}
