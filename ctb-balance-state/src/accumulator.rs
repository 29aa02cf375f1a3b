//! Homomorphic accumulation of incoming pending credits.

use ctb_common::CiphertextAlgebra;

/// Fold one incoming credit into the accumulated pending ciphertext.
pub fn accumulate<C: CiphertextAlgebra>(current: &C, incoming: &C) -> C {
    current.combine(incoming)
}

/// Fold any number of credits, starting from the zero ciphertext.
pub fn accumulate_all<'a, C, I>(credits: I) -> C
where
    C: CiphertextAlgebra + 'a,
    I: IntoIterator<Item = &'a C>,
{
    credits
        .into_iter()
        .fold(C::zero(), |acc, credit| accumulate(&acc, credit))
}
